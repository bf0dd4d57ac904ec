use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;
use tutorgate_core::canned::{GENERAL_RESPONSES, TUTOR_APOLOGY};
use tutorgate_core::session::{BUDDY_GREETING, TUTOR_WELCOME};

struct CliTestEnv {
    _temp_dir: TempDir,
    home: PathBuf,
    xdg_data: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_data = base.join("xdg-data");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_data).expect("failed to create XDG_DATA_HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        Self {
            _temp_dir: temp_dir,
            home,
            xdg_data,
            xdg_config,
            xdg_state,
        }
    }

    fn write_config(&self, contents: &str) {
        let dir = self.xdg_config.join("tutorgate");
        fs::create_dir_all(&dir).expect("failed to create config dir");
        fs::write(dir.join("config.toml"), contents).expect("failed to write config");
    }

    fn store_path(&self) -> PathBuf {
        self.xdg_data.join("tutorgate/store.db")
    }
}

fn command(env: &CliTestEnv, bin_name: &str, args: &[&str]) -> Command {
    let bin_path = match bin_name {
        "tutorgate" => PathBuf::from(assert_cmd::cargo::cargo_bin!("tutorgate")),
        "tutorgate-kb" => PathBuf::from(assert_cmd::cargo::cargo_bin!("tutorgate-kb")),
        _ => panic!("unsupported binary in test harness: {bin_name}"),
    };

    let mut command = Command::new(bin_path);
    command
        .args(args)
        .env("HOME", &env.home)
        .env("XDG_DATA_HOME", &env.xdg_data)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .env_remove("OPENAI_API_KEY")
        .env_remove("GOOGLE_API_KEY")
        .env_remove("RUST_LOG");
    command
}

fn run_bin(env: &CliTestEnv, bin_name: &str, args: &[&str]) -> Output {
    command(env, bin_name, args)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute {bin_name}: {e}"))
}

fn run_bin_with_stdin(env: &CliTestEnv, bin_name: &str, args: &[&str], input: &str) -> Output {
    let mut child = command(env, bin_name, args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap_or_else(|e| panic!("failed to spawn {bin_name}: {e}"));
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(input.as_bytes())
        .expect("failed to write stdin");
    child
        .wait_with_output()
        .unwrap_or_else(|e| panic!("failed to wait for {bin_name}: {e}"))
}

fn assert_success(bin_name: &str, args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "{bin_name} {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

#[test]
fn once_without_providers_answers_from_canned_engine() {
    let env = CliTestEnv::new();
    let args = ["--once", "explain photosynthesis", "--mode", "buddy", "--verbose"];

    let output = run_bin(&env, "tutorgate", &args);
    assert_success("tutorgate", &args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.starts_with("Buddy [canned]: "),
        "expected canned buddy reply, got:\n{stdout}"
    );
    assert!(
        GENERAL_RESPONSES.iter().any(|r| stdout.contains(r)),
        "expected a general canned response, got:\n{stdout}"
    );
}

#[test]
fn once_with_empty_priority_list_uses_static_reply() {
    let env = CliTestEnv::new();
    env.write_config(
        r#"
[routing]
socratic = []
terminal = "static"
"#,
    );
    let args = ["--once", "what is a verb", "--verbose"];

    let output = run_bin(&env, "tutorgate", &args);
    assert_success("tutorgate", &args, &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("Socratic Tutor [terminal]: {TUTOR_APOLOGY}")
    );
}

#[test]
fn invalid_config_fails_with_message() {
    let env = CliTestEnv::new();
    env.write_config(
        r#"
[routing]
direct = ["canned", "canned"]
"#,
    );

    let output = run_bin(&env, "tutorgate", &["--once", "hi"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("more than once"),
        "expected duplicate backend error, got:\n{stderr}"
    );
}

#[test]
fn interactive_session_switches_modes() {
    let env = CliTestEnv::new();
    let input = "/buddy\n/buddy\nwhat is 2+2\n/tutor\n/quit\n";

    let output = run_bin_with_stdin(&env, "tutorgate", &[], input);
    assert_success("tutorgate", &[], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(TUTOR_WELCOME));
    assert!(stdout.contains(BUDDY_GREETING));
    assert!(stdout.contains("Already talking to Buddy."));
    assert!(stdout.contains("I'm your Socratic Tutor now."));
}

#[test]
fn kb_lists_seed_collections_on_fresh_store() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, "tutorgate-kb", &["documents"]);
    assert_success("tutorgate-kb", &["documents"], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Quantum_Physics_Lecture_Notes.pdf"));
    assert!(stdout.contains("Cell_Biology_Data.xlsx"));
    assert!(
        env.store_path().exists(),
        "store should exist at {}",
        env.store_path().display()
    );
}

#[test]
fn kb_add_search_and_delete_round_trip() {
    let env = CliTestEnv::new();

    let add_args = [
        "add-document",
        "--file-name",
        "Fractions_Worksheet.docx",
        "--subject",
        "Mathematics",
        "--faculty",
        "Dr. Ada Lovelace",
        "--keywords",
        "fractions, ratios",
    ];
    let output = run_bin(&env, "tutorgate-kb", &add_args);
    assert_success("tutorgate-kb", &add_args, &output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("(word, unknown)"), "got:\n{stdout}");

    let search_args = ["--json", "search", "ratios"];
    let output = run_bin(&env, "tutorgate-kb", &search_args);
    assert_success("tutorgate-kb", &search_args, &output);
    let docs: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("search output should be JSON");
    assert_eq!(docs.as_array().map(Vec::len), Some(1));
    assert_eq!(docs[0]["id"], 4);
    assert_eq!(docs[0]["keywords"][1], "ratios");

    let output = run_bin(&env, "tutorgate-kb", &["delete-document", "4"]);
    assert_success("tutorgate-kb", &["delete-document", "4"], &output);

    let output = run_bin(&env, "tutorgate-kb", &["delete-document", "4"]);
    assert!(!output.status.success(), "second delete should fail");
}

#[test]
fn kb_lists_subjects() {
    let env = CliTestEnv::new();
    let output = run_bin(&env, "tutorgate-kb", &["subjects"]);
    assert_success("tutorgate-kb", &["subjects"], &output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let subjects: Vec<&str> = stdout.lines().collect();
    assert_eq!(subjects.len(), 12);
    assert_eq!(subjects[0], "Mathematics");
}

#[test]
fn kb_documents_filter_by_faculty_and_subject() {
    let env = CliTestEnv::new();

    let args = ["documents", "--faculty", "Dr. Andrew Ng"];
    let output = run_bin(&env, "tutorgate-kb", &args);
    assert_success("tutorgate-kb", &args, &output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Machine_Learning_Algorithms.pdf"));
    assert_eq!(stdout.lines().count(), 1, "got:\n{stdout}");

    let args = [
        "documents",
        "--faculty",
        "Dr. Andrew Ng",
        "--subject",
        "Physics",
    ];
    let output = run_bin(&env, "tutorgate-kb", &args);
    assert_success("tutorgate-kb", &args, &output);
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "No documents found."
    );

    let args = [
        "--json",
        "documents",
        "--faculty",
        "Dr. Richard Feynman",
        "--subject",
        "Physics",
    ];
    let output = run_bin(&env, "tutorgate-kb", &args);
    assert_success("tutorgate-kb", &args, &output);
    let docs: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("documents output should be JSON");
    assert_eq!(docs.as_array().map(Vec::len), Some(1));
    assert_eq!(docs[0]["fileName"], "Quantum_Physics_Lecture_Notes.pdf");
}
