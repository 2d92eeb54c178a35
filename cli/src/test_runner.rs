use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use interro::{Document, EscapeRule, ParseOptions, Syntax};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Marker dialect. Detected from the document when absent.
    #[serde(default)]
    pub syntax: Option<Syntax>,

    #[serde(default)]
    pub escape: EscapeRule,

    /// If true, the test expects parsing to fail.
    #[serde(default)]
    pub expect_parse_error: bool,

    /// Substring of the expected parse error, or of the error returned by
    /// `critique`/`improve`.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// Exact rendered text.
    #[serde(default)]
    pub expect_render: Option<String>,

    #[serde(default)]
    pub expect_block_count: Option<usize>,

    /// Names of the top-level blocks only, in document order. Nested blocks
    /// count toward `expect_block_count` but are not listed here.
    #[serde(default)]
    pub expect_block_names: Option<Vec<String>>,

    /// Build the critique instruction for this block.
    #[serde(default)]
    pub critique: Option<String>,

    /// Build the improve instruction for this block.
    #[serde(default)]
    pub improve: Option<String>,

    /// Substring of the text returned by `critique`/`improve`.
    #[serde(default)]
    pub expect_output: Option<String>,
}

impl TestConfig {
    fn parse_options(&self, source: &str) -> ParseOptions {
        ParseOptions {
            syntax: self.syntax.unwrap_or_else(|| Syntax::detect(source)),
            escape_rule: self.escape,
        }
    }
}

/// Split a `.test.md` file into its TOML config and the document under test.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("cannot read file: {}", e)),
            };
        }
    };

    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("frontmatter error: {}", e)),
            };
        }
    };

    log::debug!("running {}", path.display());
    TestResult {
        path: path.to_path_buf(),
        description: config.description.clone(),
        outcome: match check_document(&config, source) {
            Ok(()) => TestOutcome::Pass,
            Err(reason) => TestOutcome::Fail(reason),
        },
    }
}

/// Parse `source` and check every expectation in `config`.
fn check_document(config: &TestConfig, source: &str) -> Result<(), String> {
    let parsed = Document::parse_with(source, config.parse_options(source));

    if config.expect_parse_error {
        return match parsed {
            Ok(_) => Err("expected parse error, but parsing succeeded".into()),
            Err(err) => expect_contains("parse error", &err.to_string(), &config.expect_error),
        };
    }

    let doc = parsed.map_err(|e| format!("unexpected parse error: {}", e))?;

    if let Some(expected) = &config.expect_render {
        let actual = doc.render();
        if &actual != expected {
            return Err(format!(
                "render mismatch\n  expected: {:?}\n  actual:   {:?}",
                expected, actual
            ));
        }
    }

    if let Some(expected) = config.expect_block_count {
        let actual = doc.block_count();
        if actual != expected {
            return Err(format!(
                "expected {} block(s), found {}",
                expected, actual
            ));
        }
    }

    if let Some(expected) = &config.expect_block_names {
        let actual: Vec<&str> = doc.blocks().iter().map(|b| b.name.as_str()).collect();
        if actual != *expected {
            return Err(format!(
                "block names mismatch\n  expected: {:?}\n  actual:   {:?}",
                expected, actual
            ));
        }
    }

    let operation = match (&config.critique, &config.improve) {
        (Some(name), _) => Some(doc.criticise_block(name)),
        (None, Some(name)) => Some(doc.improve_block(name)),
        (None, None) => None,
    };

    match (operation, &config.expect_error) {
        (Some(Ok(text)), None) => expect_contains("output", &text, &config.expect_output),
        (Some(Ok(_)), Some(expected)) => Err(format!(
            "expected error containing \"{}\", but the operation succeeded",
            expected
        )),
        (Some(Err(err)), Some(_)) => {
            expect_contains("error", &err.to_string(), &config.expect_error)
        }
        (Some(Err(err)), None) => Err(format!("unexpected error: {}", err)),
        (None, Some(_)) => Err("expect_error needs `critique` or `improve`".into()),
        (None, None) => Ok(()),
    }
}

fn expect_contains(what: &str, actual: &str, expected: &Option<String>) -> Result<(), String> {
    match expected {
        Some(needle) if !actual.contains(needle.as_str()) => Err(format!(
            "expected {} containing \"{}\", got: {}",
            what, needle, actual
        )),
        _ => Ok(()),
    }
}

/// Discover `.test.md` files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(".test.md"))
        {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(cat), files.len());
    }
}

struct Style {
    no_color: bool,
}

impl Style {
    fn paint(&self, code: &str, s: &str) -> String {
        if self.no_color {
            s.to_string()
        } else {
            format!("\x1b[{}m{}\x1b[0m", code, s)
        }
    }

    fn pass(&self) -> String {
        self.paint("32", "PASS")
    }

    fn fail(&self) -> String {
        self.paint("31", "FAIL")
    }

    fn bold(&self, s: &str) -> String {
        self.paint("1", s)
    }
}

/// Select the categories to run. Unknown names only warn.
fn filter_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a Vec<PathBuf>> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v)).collect();
    }

    let mut filtered = BTreeMap::new();
    for req in requested {
        let req = req.trim_matches('/');
        let prefix = format!("{}/", req);
        let mut found = false;
        for (cat, files) in all {
            if cat == req || cat.starts_with(&prefix) {
                filtered.insert(cat.as_str(), files);
                found = true;
            }
        }
        if !found {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all.keys()
                    .map(|k| category_label(k))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    filtered
}

/// Run all `.test.md` files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let style = Style { no_color };
    let mut results = Vec::new();

    if path.is_file() {
        let result = run_single_test(path);
        report(&style, &result);
        results.push(result);
    } else {
        let all_categories = discover_categorized(path);
        if all_categories.is_empty() {
            eprintln!("no .test.md files found in {}", path.display());
            return 1;
        }

        let run_categories = filter_categories(&all_categories, categories);
        if run_categories.is_empty() {
            eprintln!("no matching categories found");
            return 1;
        }

        for (cat, files) in &run_categories {
            eprintln!();
            eprintln!("{}", style.bold(category_label(cat)));
            for file in *files {
                let result = run_single_test(file);
                report(&style, &result);
                results.push(result);
            }
        }
    }

    summarize(&style, &results)
}

fn report(style: &Style, result: &TestResult) {
    let label = match result.outcome {
        TestOutcome::Pass => style.pass(),
        TestOutcome::Fail(_) => style.fail(),
    };
    eprintln!("  {}  {}", label, result.label());
}

fn summarize(style: &Style, results: &[TestResult]) -> i32 {
    let failures: Vec<_> = results
        .iter()
        .filter_map(|r| match &r.outcome {
            TestOutcome::Fail(reason) => Some((r, reason)),
            TestOutcome::Pass => None,
        })
        .collect();
    let failed = failures.len();
    let passed = results.len() - failed;

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for (result, reason) in &failures {
            eprintln!();
            eprintln!("  --- {} ---", result.path.display());
            for line in reason.lines() {
                eprintln!("  {}", line);
            }
        }
    }

    eprintln!();
    if failed == 0 {
        eprintln!("test result: {}. {} passed, 0 failed", style.paint("32", "ok"), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            style.paint("31", "FAILED"),
            passed,
            failed,
            results.len()
        );
        1
    }
}
