#[test]
fn quillpipe_version_text_output_contract() {
    let bin = assert_cmd::cargo::cargo_bin!("quillpipe");
    let out = std::process::Command::new(bin)
        .args(["version", "--output", "text"])
        .env("QUILLPIPE_DOTENV", "0")
        .output()
        .expect("run quillpipe version --output text");

    assert!(out.status.success(), "quillpipe version failed");
    let s = String::from_utf8_lossy(&out.stdout);
    assert!(
        s.trim_start().starts_with("quillpipe "),
        "expected text output to start with `quillpipe `"
    );
}

#[test]
fn quillpipe_version_json_output_contract() {
    let bin = assert_cmd::cargo::cargo_bin!("quillpipe");
    let out = std::process::Command::new(bin)
        .args(["version"])
        .env("QUILLPIPE_DOTENV", "0")
        .output()
        .expect("run quillpipe version");

    assert!(out.status.success(), "quillpipe version failed");
    let v: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("version output is json");
    assert_eq!(v["name"].as_str(), Some("quillpipe"));
    assert!(v["version"].as_str().is_some());
}

#[test]
fn quillpipe_doctor_text_output_contract() {
    let bin = assert_cmd::cargo::cargo_bin!("quillpipe");
    let out = std::process::Command::new(bin)
        .args(["doctor", "--output", "text"])
        .env("QUILLPIPE_DOTENV", "0")
        // Ensure we don't accidentally inherit keys from the environment.
        .env_remove("QUILLPIPE_GOOGLE_API_KEY")
        .env_remove("GOOGLE_SEARCH_API_KEY")
        .env_remove("QUILLPIPE_GOOGLE_CX")
        .env_remove("GOOGLE_SEARCH_CX")
        .env_remove("QUILLPIPE_LLM_API_KEY")
        .env_remove("DEEPINFRA_API_KEY")
        .output()
        .expect("run quillpipe doctor --output text");

    assert!(out.status.success(), "quillpipe doctor failed");
    let s = String::from_utf8_lossy(&out.stdout);
    assert!(s.contains("quillpipe "), "expected doctor text output to mention quillpipe");
    assert!(s.contains("checks:"), "expected checks summary");
}

#[test]
fn quillpipe_doctor_reports_presence_without_values() {
    let bin = assert_cmd::cargo::cargo_bin!("quillpipe");
    let out = std::process::Command::new(bin)
        .args(["doctor"])
        .env("QUILLPIPE_DOTENV", "0")
        .env("QUILLPIPE_GOOGLE_API_KEY", "secret-key-value")
        .env("QUILLPIPE_GOOGLE_CX", "secret-cx-value")
        .env_remove("QUILLPIPE_LLM_API_KEY")
        .env_remove("DEEPINFRA_API_KEY")
        .output()
        .expect("run quillpipe doctor");

    assert!(out.status.success(), "quillpipe doctor failed");
    let s = String::from_utf8_lossy(&out.stdout);
    assert!(!s.contains("secret-key-value"), "doctor must never print secret values");
    assert!(!s.contains("secret-cx-value"), "doctor must never print secret values");

    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("doctor output is json");
    assert_eq!(v["kind"].as_str(), Some("doctor"));
    assert_eq!(v["ok"].as_bool(), Some(false), "llm key missing => ok=false");
    let checks = v["checks"].as_array().expect("checks array");
    let by_name = |name: &str| {
        checks
            .iter()
            .find(|c| c["name"].as_str() == Some(name))
            .unwrap_or_else(|| panic!("missing check {name}"))
    };
    assert_eq!(by_name("google_api_key")["ok"].as_bool(), Some(true));
    assert_eq!(by_name("google_cx")["ok"].as_bool(), Some(true));
    assert_eq!(by_name("llm_api_key")["ok"].as_bool(), Some(false));
}
