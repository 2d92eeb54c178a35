use std::fs;

use agent::{Agent, AgentConfig, AgentError, EchoGenerator, Tool, ToolOutput, load_document};
use interro::{Instruction, ParseOptions, Syntax};
use tempfile::TempDir;

const PROPOSAL: &str = "\
# Proposal
!interro summary rw \"keep it under fifty words\"
We will build a parser for annotated documents.
!interro risks ro \"must name one risk\"
Escape handling is subtle.
!end risks
!end summary
Thanks for reading.
";

#[test]
fn load_document_detects_the_dialect() {
    let dir = TempDir::new().unwrap();
    let bang = dir.path().join("bang.md");
    let query = dir.path().join("query.md");
    fs::write(&bang, PROPOSAL).unwrap();
    fs::write(&query, "?! a ro \"p\" x ?! a end").unwrap();

    let doc = load_document(&bang, None).unwrap();
    assert_eq!(doc.block_count(), 2);
    assert_eq!(doc.options().syntax, Syntax::Bang);

    let doc = load_document(&query, None).unwrap();
    assert_eq!(doc.options().syntax, Syntax::Query);
    assert_eq!(doc.block_names(), ["a"]);
}

#[test]
fn load_document_reports_missing_files() {
    let dir = TempDir::new().unwrap();
    let err = load_document(&dir.path().join("nope.md"), None).unwrap_err();
    assert!(matches!(err, AgentError::Io { .. }));
    assert!(err.to_string().starts_with("cannot read"));
}

#[test]
fn forced_options_override_detection() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("doc.md");
    fs::write(&path, PROPOSAL).unwrap();
    let options = ParseOptions {
        syntax: Syntax::Query,
        ..ParseOptions::default()
    };
    let doc = load_document(&path, Some(options)).unwrap();
    assert_eq!(doc.block_count(), 0);
    assert_eq!(doc.render(), PROPOSAL);
}

#[test]
fn tools_by_name() {
    let render = "render".parse::<Tool>().unwrap();
    let out = render.invoke(PROPOSAL, ParseOptions::default()).unwrap();
    assert_eq!(
        out,
        ToolOutput::Text(
            "# Proposal\nWe will build a parser for annotated documents.\nEscape handling is subtle.\nThanks for reading.\n"
                .to_string()
        )
    );

    let improve = "improve".parse::<Tool>().unwrap();
    let ToolOutput::Text(text) = improve.invoke(PROPOSAL, ParseOptions::default()).unwrap() else {
        panic!("improve returns text");
    };
    assert!(text.starts_with("summary\n"));
    assert!(text.contains("!interro risks ro"));
}

#[test]
fn agent_with_global_prompt_from_config() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("global_prompt.md"), "Answer in British English.").unwrap();
    let config_path = dir.path().join("agent.toml");
    fs::write(
        &config_path,
        "name = \"reviewer\"\nglobal_prompt = \"global_prompt.md\"\n",
    )
    .unwrap();

    let config = AgentConfig::load_from_path(&config_path).unwrap();
    let agent = Agent::new(config, EchoGenerator).unwrap();
    assert!(agent.system_prompt().ends_with("Answer in British English."));

    let doc = agent.load(PROPOSAL).unwrap();
    let blocks = agent.respond(&doc, Instruction::Improve).unwrap();
    assert_eq!(blocks.len(), 1);
    let response = blocks[0].response.as_deref().unwrap();
    assert!(response.contains("Answer in British English."));
    assert!(response.contains("\"keep it under fifty words\""));
}

#[test]
fn agent_fails_fast_on_missing_global_prompt() {
    let config = AgentConfig {
        global_prompt: Some("/definitely/not/here.md".into()),
        ..AgentConfig::default()
    };
    assert!(matches!(
        Agent::new(config, EchoGenerator),
        Err(AgentError::Config(_))
    ));
}
