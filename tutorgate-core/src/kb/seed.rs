//! Collections a fresh store starts with.

use super::{DocumentFile, FileType, KnowledgeBaseItem};

pub fn topics() -> Vec<KnowledgeBaseItem> {
    vec![
        KnowledgeBaseItem {
            id: 1,
            topic: "Introduction to Quantum Physics".to_string(),
            explanation: "Quantum physics is a fundamental theory in physics that describes the behavior of matter and energy at the atomic and subatomic scales. It departs from classical physics in that energy, momentum, and other quantities are often restricted to discrete values (quantization), objects have characteristics of both particles and waves, and there are limits to how accurately the value of a physical quantity can be predicted before measurement.\n\nKey principles include the uncertainty principle developed by Werner Heisenberg, and wave-particle duality, which states that all particles exhibit both wave and particle properties under different experimental conditions.".to_string(),
            image_url: "/quantum.jpg".to_string(),
            subject: Some("Physics".to_string()),
            faculty_name: Some("Dr. Richard Feynman".to_string()),
            date: Some("2023-11-15".to_string()),
        },
        KnowledgeBaseItem {
            id: 2,
            topic: "The Basics of Machine Learning".to_string(),
            explanation: "Machine learning is a branch of artificial intelligence based on the idea that systems can learn from data, identify patterns, and make decisions with minimal human intervention.\n\nThere are several types of machine learning:\n\n1. Supervised Learning: the algorithm learns from labeled training data.\n\n2. Unsupervised Learning: the algorithm finds patterns in unlabeled data.\n\n3. Reinforcement Learning: the algorithm learns by interacting with an environment and receiving rewards or penalties.".to_string(),
            image_url: "/machine-learning.jpg".to_string(),
            subject: Some("Computer Science".to_string()),
            faculty_name: Some("Dr. Andrew Ng".to_string()),
            date: Some("2023-12-01".to_string()),
        },
        KnowledgeBaseItem {
            id: 3,
            topic: "Cell Biology Fundamentals".to_string(),
            explanation: "Cell biology is the study of cell structure and function, and it revolves around the concept that the cell is the fundamental unit of life.\n\nThere are two main types of cells:\n\n1. Prokaryotic cells: simpler, smaller cells that lack a true nucleus and membrane-bound organelles.\n\n2. Eukaryotic cells: more complex cells with a true nucleus and various membrane-bound organelles.".to_string(),
            image_url: "/cell-biology.jpg".to_string(),
            subject: Some("Biology".to_string()),
            faculty_name: Some("Dr. Jane Goodall".to_string()),
            date: Some("2023-10-20".to_string()),
        },
    ]
}

pub fn documents() -> Vec<DocumentFile> {
    vec![
        DocumentFile {
            id: 1,
            file_name: "Quantum_Physics_Lecture_Notes.pdf".to_string(),
            file_type: FileType::Pdf,
            file_url: "/files/quantum-physics.pdf".to_string(),
            upload_date: "2023-11-16".to_string(),
            subject: "Physics".to_string(),
            faculty_name: "Dr. Richard Feynman".to_string(),
            description: Some("Comprehensive lecture notes on quantum physics fundamentals".to_string()),
            keywords: keywords(&["quantum", "physics", "mechanics", "wave", "particle"]),
            size: "2.4 MB".to_string(),
        },
        DocumentFile {
            id: 2,
            file_name: "Machine_Learning_Algorithms.pdf".to_string(),
            file_type: FileType::Pdf,
            file_url: "/files/ml-algorithms.pdf".to_string(),
            upload_date: "2023-12-02".to_string(),
            subject: "Computer Science".to_string(),
            faculty_name: "Dr. Andrew Ng".to_string(),
            description: Some(
                "Overview of popular machine learning algorithms and their applications".to_string(),
            ),
            keywords: keywords(&["machine learning", "algorithms", "AI", "neural networks"]),
            size: "3.1 MB".to_string(),
        },
        DocumentFile {
            id: 3,
            file_name: "Cell_Biology_Data.xlsx".to_string(),
            file_type: FileType::Excel,
            file_url: "/files/cell-biology-data.xlsx".to_string(),
            upload_date: "2023-10-21".to_string(),
            subject: "Biology".to_string(),
            faculty_name: "Dr. Jane Goodall".to_string(),
            description: Some("Experimental data on cell structures and functions".to_string()),
            keywords: keywords(&["biology", "cell", "data", "experiment", "organelles"]),
            size: "1.8 MB".to_string(),
        },
    ]
}

fn keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}
