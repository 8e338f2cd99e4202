//! Commit gate: refuses `git commit` while a staged task spec is unfinished.
//!
//! Checks run in order and the first failure denies:
//! 1. Impact Tree Analysis has no unchecked boxes (always on)
//! 2. Implementation Plan exists and has a `### Task N`
//! 3. The spark session for that task finished research with enough files
//! 4. Eval Criteria (or a legacy Tests section) lists enough cases
//!
//! Anything the gate can't determine (git failing, no staged spec, no
//! session state) lets the commit through.

use std::borrow::Cow;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::allowlist::FEATURES_DIR;
use crate::config::{EnforcementPolicy, HooksConfig};
use crate::diagnostics::Trace;
use crate::error::{GateError, Result};
use crate::models::{Decision, HookInput};
use crate::process::{CommandRunner, GIT_TIMEOUT};
use crate::rules::compile;

/// Spark session directories, relative to the project root
pub const SPARK_DIR: &str = "ai/.spark";

const IMPACT_TREE: &str = "## Impact Tree Analysis";
const IMPLEMENTATION_PLAN: &str = "## Implementation Plan";
const EVAL_CRITERIA: &str = "## Eval Criteria";
const TESTS: &str = "## Tests";

const MSG_IMPACT_TREE: &str = "Spec has unfilled Impact Tree checkboxes!\n\n\
Complete the Impact Tree Analysis before committing:\n\
1. Fill all checkboxes in Impact Tree section\n\
2. Ensure grep results are recorded\n\
3. Verify all found files are in Allowed Files\n\n\
See: CLAUDE.md -> Impact Tree Analysis";

const MSG_NO_PLAN: &str = "Spec missing Implementation Plan!\n\n\
Add ## Implementation Plan with at least one ### Task section.\n\
Each task needs: Type, Files, Acceptance criteria.\n\n\
See: feature-mode.md -> Phase 5: WRITE";

const MSG_NO_TASKS: &str = "Implementation Plan has no tasks!\n\n\
Add at least one ### Task section with:\n\
- Type (code | test | migrate)\n\
- Files to create/modify\n\
- Acceptance criteria";

const MSG_NO_COVERAGE: &str = "Eval Criteria missing ### Coverage Summary!\n\n\
Add coverage summary with counts per type.\n\n\
See: feature-mode.md -> Phase 6: VALIDATE -> Gate 2";

// `commit` but not `commit-graph` / `commit-tree`
static GIT_COMMIT: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"(?i)\bgit\s+commit(?:[^A-Za-z0-9_-]|$)"));

static CODE_BLOCK: LazyLock<Option<Regex>> = LazyLock::new(|| compile(r"(?s)```.*?```"));

static TASK_HEADING: LazyLock<Option<Regex>> = LazyLock::new(|| compile(r"(?i)### Task \d+"));

static EVAL_ROW: LazyLock<Option<Regex>> = LazyLock::new(|| compile(r"\|\s*EC-\d+"));

static COVERAGE_SUMMARY: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"(?i)### Coverage Summary"));

static TEST_CHECKBOX: LazyLock<Option<Regex>> = LazyLock::new(|| compile(r"- \[[ x]\]"));

static SPEC_ID: LazyLock<Option<Regex>> =
    LazyLock::new(|| compile(r"(?i)(?:FTR|BUG|TECH|ARCH)-\d+"));

#[derive(Debug, Default, Deserialize)]
struct SessionState {
    #[serde(default)]
    phases: Phases,
}

#[derive(Debug, Default, Deserialize)]
struct Phases {
    #[serde(default)]
    research: Option<ResearchPhase>,
}

#[derive(Debug, Deserialize)]
struct ResearchPhase {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    files: Vec<serde_json::Value>,
}

/// True if the command runs `git commit`
pub fn is_git_commit(command: &str) -> bool {
    GIT_COMMIT.as_ref().is_some_and(|re| re.is_match(command))
}

/// From `heading` up to the next `## ` heading or end of document.
fn section<'a>(content: &'a str, heading: &str) -> Option<&'a str> {
    let start = content.find(heading)?;
    let body = start + heading.len();
    let end = content[body..]
        .find("\n## ")
        .map_or(content.len(), |i| body + i);
    Some(&content[start..end])
}

fn strip_code_blocks(text: &str) -> Cow<'_, str> {
    match CODE_BLOCK.as_ref() {
        Some(re) => re.replace_all(text, ""),
        None => Cow::Borrowed(text),
    }
}

fn count(re: &Option<Regex>, text: &str) -> usize {
    re.as_ref().map_or(0, |re| re.find_iter(text).count())
}

fn has_match(re: &Option<Regex>, text: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(text))
}

/// Unchecked boxes outside code blocks in the Impact Tree. No section passes.
pub fn check_impact_tree(content: &str) -> Option<String> {
    let impact = section(content, IMPACT_TREE)?;
    strip_code_blocks(impact)
        .contains("- [ ]")
        .then(|| MSG_IMPACT_TREE.to_string())
}

pub fn check_implementation_plan(content: &str) -> Option<String> {
    let Some(plan) = section(content, IMPLEMENTATION_PLAN) else {
        return Some(MSG_NO_PLAN.to_string());
    };
    (!has_match(&TASK_HEADING, plan)).then(|| MSG_NO_TASKS.to_string())
}

/// Newest spark session directory whose name mentions the task ID.
fn session_dir(project_root: &Path, spec_file: &str) -> Option<String> {
    let spec_id = SPEC_ID.as_ref()?.find(spec_file)?.as_str().to_lowercase();
    let mut names: Vec<String> = fs::read_dir(project_root.join(SPARK_DIR))
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.to_lowercase().contains(&spec_id))
        .collect();
    names.sort();
    names.pop()
}

/// Research phase state for the task's spark session.
///
/// No ID in the file name, no session, or unreadable state all pass.
pub fn check_research(project_root: &Path, spec_file: &str, min_files: usize) -> Option<String> {
    let name = session_dir(project_root, spec_file)?;
    let state_path = format!("{SPARK_DIR}/{name}/state.json");
    let raw = fs::read(project_root.join(&state_path)).ok()?;
    let state: SessionState = serde_json::from_slice(&raw).ok()?;

    let research = match state.phases.research {
        Some(research) if research.status.as_deref() == Some("done") => research,
        research => {
            let status = research
                .and_then(|r| r.status)
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "missing".to_string());
            return Some(format!(
                "Research phase not completed!\n\n\
                 State: {state_path}\n\
                 Research status: {status}\n\n\
                 Complete research phase before committing spec.\n\
                 Run scouts to research the feature first."
            ));
        }
    };

    let found = research.files.len();
    (found < min_files).then(|| {
        format!(
            "Research has only {found} files (minimum: {min_files})!\n\n\
             State: {state_path}\n\n\
             Ensure all scouts produced research files."
        )
    })
}

/// Eval Criteria when the document has them, else the legacy Tests section.
pub fn check_tests(content: &str, min_cases: usize) -> Option<String> {
    let has_eval = content.starts_with(EVAL_CRITERIA)
        || content.contains(&format!("\n{EVAL_CRITERIA}"));
    if has_eval {
        let eval = strip_code_blocks(section(content, EVAL_CRITERIA)?);
        let rows = count(&EVAL_ROW, &eval);
        if rows < min_cases {
            return Some(format!(
                "Eval Criteria has only {rows} criteria (minimum: {min_cases})!\n\n\
                 Add more eval criteria including edge cases from devil's advocate.\n\n\
                 See: feature-mode.md -> Phase 5: WRITE -> Eval Criteria (MANDATORY)"
            ));
        }
        return (!has_match(&COVERAGE_SUMMARY, &eval)).then(|| MSG_NO_COVERAGE.to_string());
    }

    let Some(tests) = section(content, TESTS) else {
        return Some(format!(
            "Spec missing Eval Criteria or Tests section!\n\n\
             Add ## Eval Criteria with at least {min_cases} criteria (preferred)\n\
             or ## Tests with at least {min_cases} test cases (legacy).\n\n\
             See: feature-mode.md -> Phase 5: WRITE -> Eval Criteria (MANDATORY)"
        ));
    };
    let cases = count(&TEST_CHECKBOX, &strip_code_blocks(tests));
    (cases < min_cases).then(|| {
        format!(
            "Tests section has only {cases} test cases (minimum: {min_cases})!\n\n\
             Add more test cases including edge cases from devil's advocate.\n\n\
             See: feature-mode.md -> Phase 6: VALIDATE -> Gate 2"
        )
    })
}

/// Run every enabled check against a spec's content; first failure wins.
pub fn validate_spec(
    content: &str,
    spec_file: &str,
    project_root: &Path,
    policy: &EnforcementPolicy,
) -> Option<(&'static str, String)> {
    if let Some(msg) = check_impact_tree(content) {
        return Some(("unchecked_impact_tree", msg));
    }
    if policy.require_plan_before_code {
        if let Some(msg) = check_implementation_plan(content) {
            return Some(("no_implementation_plan", msg));
        }
    }
    if policy.require_research_for_spec {
        if let Some(msg) = check_research(project_root, spec_file, policy.min_research_files) {
            return Some(("research_incomplete", msg));
        }
    }
    if policy.require_tests_in_spec {
        if let Some(msg) = check_tests(content, policy.min_test_cases) {
            return Some(("tests_incomplete", msg));
        }
    }
    None
}

/// First staged task spec, as a path relative to the project root.
fn staged_spec(runner: &dyn CommandRunner, project_root: &Path) -> Option<String> {
    let root = project_root.to_string_lossy();
    let output = runner
        .run(
            "git",
            &["-C", &root, "diff", "--cached", "--name-only"],
            GIT_TIMEOUT,
        )
        .ok()?;
    if !output.success() {
        return None;
    }
    let prefix = format!("{FEATURES_DIR}/");
    output
        .stdout
        .lines()
        .find(|f| f.starts_with(&prefix) && f.ends_with(".md"))
        .map(String::from)
}

/// Decide on a shell command; only `git commit` is inspected.
pub fn evaluate(
    command: &str,
    config: &HooksConfig,
    runner: &dyn CommandRunner,
    trace: &Trace,
) -> Result<Decision> {
    if !is_git_commit(command) {
        trace.event("skip", serde_json::json!({"reason": "not_git_commit"}));
        return Ok(Decision::Allow);
    }

    let Some(spec_file) = staged_spec(runner, &config.project_root) else {
        trace.event("skip", serde_json::json!({"reason": "no_spec_staged"}));
        return Ok(Decision::Allow);
    };
    let spec_path = config.project_root.join(&spec_file);
    if !spec_path.exists() {
        trace.event("skip", serde_json::json!({"reason": "spec_missing", "spec": spec_file}));
        return Ok(Decision::Allow);
    }

    trace.event("spec_found", serde_json::json!({"spec": spec_file}));
    let bytes = fs::read(&spec_path).map_err(|e| GateError::io(&spec_path, e))?;
    let content = String::from_utf8_lossy(&bytes);

    match validate_spec(&content, &spec_file, &config.project_root, &config.enforcement) {
        Some((reason, msg)) => {
            trace.event("deny", serde_json::json!({"reason": reason, "spec": spec_file}));
            Ok(Decision::Deny(msg))
        }
        None => Ok(Decision::Allow),
    }
}

/// Hook entry: evaluate `tool_input.command`.
pub fn check(
    input: &HookInput,
    config: &HooksConfig,
    runner: &dyn CommandRunner,
    trace: &Trace,
) -> Result<Decision> {
    let command = input.command();
    trace.event("input", serde_json::json!({"command": command}));
    evaluate(command, config, runner, trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessError;
    use crate::process::fake::FakeRunner;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const SPEC_FILE: &str = "ai/features/FTR-042-2026-02-22-auth.md";

    const IMPACT_DONE: &str = "## Impact Tree Analysis\n- [x] grep callers\n- [x] list files\n\n";
    const PLAN: &str = "## Implementation Plan\n\n### Task 1: login\nType: code\n\n";
    const EVAL: &str = "## Eval Criteria\n\n| ID | Case |\n|----|------|\n\
        | EC-1 | valid login |\n| EC-2 | bad password |\n| EC-3 | locked account |\n\n\
        ### Coverage Summary\n3 deterministic\n";

    fn complete_spec() -> String {
        format!("# FTR-042: Auth\n\n{IMPACT_DONE}{PLAN}{EVAL}")
    }

    struct Repo {
        dir: TempDir,
        config: HooksConfig,
    }

    impl Repo {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let config = HooksConfig {
                project_root: dir.path().to_path_buf(),
                error_log: dir.path().join("hook-errors.log"),
                ..Default::default()
            };
            Self { dir, config }
        }

        fn write(&self, rel: &str, content: &str) -> PathBuf {
            let path = self.dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
            path
        }

        fn research(&self, session: &str, state: &str) {
            self.write(&format!("{SPARK_DIR}/{session}/state.json"), state);
        }

        fn validate(&self, content: &str) -> Option<String> {
            validate_spec(content, SPEC_FILE, self.dir.path(), &self.config.enforcement)
                .map(|(_, msg)| msg)
        }

        fn commit_with_staged(&self, staged: &str) -> Decision {
            let runner = FakeRunner::new().then_ok(0, staged);
            evaluate("git commit -m 'spec'", &self.config, &runner, &Trace::disabled("t")).unwrap()
        }
    }

    fn research_state(status: &str, files: usize) -> String {
        let files: Vec<String> = (0..files).map(|i| format!("\"r{i}.md\"")).collect();
        format!(
            r#"{{"phases": {{"research": {{"status": "{status}", "files": [{}]}}}}}}"#,
            files.join(",")
        )
    }

    #[test]
    fn test_patterns_compile() {
        for re in [
            &GIT_COMMIT,
            &CODE_BLOCK,
            &TASK_HEADING,
            &EVAL_ROW,
            &COVERAGE_SUMMARY,
            &TEST_CHECKBOX,
            &SPEC_ID,
        ] {
            assert!(re.is_some());
        }
    }

    // === trigger ===

    #[test]
    fn test_only_git_commit_triggers() {
        assert!(is_git_commit("git commit -m x"));
        assert!(is_git_commit("git add . && git commit"));
        assert!(is_git_commit("GIT COMMIT --amend"));
        assert!(!is_git_commit("git commit-graph write"));
        assert!(!is_git_commit("git commit-tree HEAD^{tree}"));
        assert!(!is_git_commit("git status"));
        assert!(!is_git_commit("echo gitcommit"));
    }

    #[test]
    fn test_non_commit_runs_no_git() {
        let repo = Repo::new();
        let runner = FakeRunner::new();
        let d = evaluate("git commit-graph write", &repo.config, &runner, &Trace::disabled("t"));
        assert_eq!(d.unwrap(), Decision::Allow);
        assert!(runner.calls.borrow().is_empty());
    }

    // === staged spec lookup ===

    #[test]
    fn test_git_failure_allows() {
        let repo = Repo::new();
        let trace = Trace::disabled("t");
        for runner in [
            FakeRunner::new().then_err(ProcessError::NotFound),
            FakeRunner::new().then_err(ProcessError::TimedOut(GIT_TIMEOUT)),
            FakeRunner::new().then_ok(128, SPEC_FILE),
        ] {
            let d = evaluate("git commit", &repo.config, &runner, &trace).unwrap();
            assert_eq!(d, Decision::Allow);
        }
    }

    #[test]
    fn test_diff_runs_against_project_root() {
        let repo = Repo::new();
        let runner = FakeRunner::new().then_ok(0, "");
        evaluate("git commit", &repo.config, &runner, &Trace::disabled("t")).unwrap();

        let calls = runner.calls.borrow();
        assert_eq!(calls[0][0], "git");
        assert_eq!(calls[0][2], repo.dir.path().to_string_lossy());
        assert!(calls[0].ends_with(&["--cached".to_string(), "--name-only".to_string()]));
    }

    #[test]
    fn test_no_staged_spec_allows() {
        let repo = Repo::new();
        repo.write("src/app.py", "x = 1\n");
        assert_eq!(repo.commit_with_staged("src/app.py\nREADME.md\n"), Decision::Allow);
        // Staged but deleted from the working tree
        assert_eq!(repo.commit_with_staged(&format!("{SPEC_FILE}\n")), Decision::Allow);
    }

    #[test]
    fn test_first_staged_spec_is_checked() {
        let repo = Repo::new();
        repo.write(SPEC_FILE, "# FTR-042\n\n## Impact Tree Analysis\n- [ ] grep callers\n");
        let staged = format!("src/app.py\n{SPEC_FILE}\nai/features/notes.txt\n");
        let Decision::Deny(msg) = repo.commit_with_staged(&staged) else {
            panic!("expected deny");
        };
        assert!(msg.starts_with("Spec has unfilled Impact Tree checkboxes!"));
    }

    #[test]
    fn test_complete_spec_commits() {
        let repo = Repo::new();
        repo.write(SPEC_FILE, &complete_spec());
        repo.research("FTR-042-session", &research_state("done", 2));
        assert_eq!(repo.commit_with_staged(SPEC_FILE), Decision::Allow);
    }

    #[test]
    fn test_check_reads_command_from_envelope() {
        let repo = Repo::new();
        repo.write(SPEC_FILE, "# empty spec\n");
        let input = HookInput::parse(r#"{"session_id": null, "tool_input": {"command": "git commit -m wip"}}"#);
        let runner = FakeRunner::new().then_ok(0, SPEC_FILE);
        let d = check(&input, &repo.config, &runner, &Trace::disabled("t")).unwrap();
        assert_eq!(d, Decision::Deny(MSG_NO_PLAN.to_string()));
    }

    // === impact tree ===

    #[test]
    fn test_unchecked_impact_tree_denied() {
        let repo = Repo::new();
        let spec = complete_spec().replace("- [x] list files", "- [ ] list files");
        assert_eq!(repo.validate(&spec), Some(MSG_IMPACT_TREE.to_string()));
    }

    #[test]
    fn test_impact_tree_ignores_code_blocks_and_later_sections() {
        let repo = Repo::new();
        let spec = format!(
            "## Impact Tree Analysis\n```\n- [ ] template line\n```\n- [x] done\n\n{PLAN}{EVAL}\n## Notes\n- [ ] later\n"
        );
        assert_eq!(check_impact_tree(&spec), None);
        assert_eq!(repo.validate(&spec), None);
    }

    #[test]
    fn test_impact_tree_checked_even_when_enforcement_off() {
        let mut repo = Repo::new();
        repo.config.enforcement = EnforcementPolicy {
            require_plan_before_code: false,
            require_research_for_spec: false,
            require_tests_in_spec: false,
            ..Default::default()
        };
        assert_eq!(repo.validate("# empty\n"), None);
        assert_eq!(
            repo.validate("## Impact Tree Analysis\n- [ ] x\n"),
            Some(MSG_IMPACT_TREE.to_string())
        );
    }

    // === implementation plan ===

    #[test]
    fn test_missing_plan_denied() {
        let repo = Repo::new();
        let spec = format!("{IMPACT_DONE}{EVAL}");
        assert_eq!(repo.validate(&spec), Some(MSG_NO_PLAN.to_string()));
    }

    #[test]
    fn test_plan_without_tasks_denied() {
        let repo = Repo::new();
        let spec = format!("{IMPACT_DONE}## Implementation Plan\nTBD\n\n{EVAL}");
        assert_eq!(repo.validate(&spec), Some(MSG_NO_TASKS.to_string()));
        // A task heading in a later section doesn't count
        let spec = "## Implementation Plan\nTBD\n\n## Later\n### Task 1\n";
        assert_eq!(check_implementation_plan(spec), Some(MSG_NO_TASKS.to_string()));
    }

    #[test]
    fn test_plan_check_can_be_disabled() {
        let mut repo = Repo::new();
        repo.config.enforcement.require_plan_before_code = false;
        assert_eq!(repo.validate(&format!("{IMPACT_DONE}{EVAL}")), None);
    }

    // === research ===

    #[test]
    fn test_research_skipped_without_session() {
        let repo = Repo::new();
        assert_eq!(check_research(repo.dir.path(), SPEC_FILE, 2), None);

        repo.research("BUG-7-other", &research_state("pending", 0));
        assert_eq!(check_research(repo.dir.path(), SPEC_FILE, 2), None);
        assert_eq!(check_research(repo.dir.path(), "ai/features/notes.md", 2), None);
    }

    #[test]
    fn test_research_not_done_denied() {
        let repo = Repo::new();
        repo.research("2026-02-22-ftr-042", &research_state("in_progress", 4));
        let msg = check_research(repo.dir.path(), SPEC_FILE, 2).unwrap();
        assert!(msg.starts_with("Research phase not completed!"));
        assert!(msg.contains("State: ai/.spark/2026-02-22-ftr-042/state.json"));
        assert!(msg.contains("Research status: in_progress"));
    }

    #[test]
    fn test_research_phase_missing_denied() {
        let repo = Repo::new();
        repo.research("FTR-042", r#"{"phases": {}}"#);
        let msg = check_research(repo.dir.path(), SPEC_FILE, 2).unwrap();
        assert!(msg.contains("Research status: missing"));
    }

    #[test]
    fn test_too_few_research_files_denied() {
        let repo = Repo::new();
        repo.research("FTR-042", &research_state("done", 1));
        let msg = check_research(repo.dir.path(), SPEC_FILE, 2).unwrap();
        assert!(msg.starts_with("Research has only 1 files (minimum: 2)!"));
        assert_eq!(check_research(repo.dir.path(), SPEC_FILE, 1), None);
    }

    #[test]
    fn test_newest_session_wins() {
        let repo = Repo::new();
        repo.research("2026-01-01-FTR-042", &research_state("pending", 0));
        repo.research("2026-03-01-FTR-042", &research_state("done", 3));
        assert_eq!(check_research(repo.dir.path(), SPEC_FILE, 2), None);
    }

    #[test]
    fn test_unreadable_state_skipped() {
        let repo = Repo::new();
        repo.research("FTR-042", "{not json");
        assert_eq!(check_research(repo.dir.path(), SPEC_FILE, 2), None);

        // Session dir without state.json
        fs::create_dir_all(repo.dir.path().join(SPARK_DIR).join("FTR-042-b")).unwrap();
        assert_eq!(check_research(repo.dir.path(), SPEC_FILE, 2), None);
    }

    #[test]
    fn test_research_runs_after_plan() {
        let repo = Repo::new();
        repo.research("FTR-042", &research_state("pending", 0));
        let msg = repo.validate(&complete_spec()).unwrap();
        assert!(msg.starts_with("Research phase not completed!"));
        assert_eq!(repo.validate(IMPACT_DONE), Some(MSG_NO_PLAN.to_string()));
    }

    // === eval criteria / tests ===

    #[test]
    fn test_too_few_eval_criteria_denied() {
        let spec = "## Eval Criteria\n| EC-1 | a |\n| EC-2 | b |\n```\n| EC-3 | in code |\n```\n### Coverage Summary\n";
        let msg = check_tests(spec, 3).unwrap();
        assert!(msg.starts_with("Eval Criteria has only 2 criteria (minimum: 3)!"));
        assert_eq!(check_tests(spec, 2), None);
    }

    #[test]
    fn test_eval_criteria_need_coverage_summary() {
        let spec = "## Eval Criteria\n| EC-1 | a |\n| EC-2 | b |\n| EC-3 | c |\n\n## Coverage Summary\n";
        assert_eq!(check_tests(spec, 3), Some(MSG_NO_COVERAGE.to_string()));
    }

    #[test]
    fn test_eval_criteria_preferred_over_tests() {
        let spec = format!("## Tests\n- [ ] a\n- [ ] b\n- [ ] c\n\n{EVAL}");
        assert_eq!(check_tests(&spec, 3), None);
        // Heading must start a line to count as the eval section
        let spec = "## Tests\n- [ ] a\n\nsee ## Eval Criteria\n";
        let msg = check_tests(spec, 3).unwrap();
        assert!(msg.starts_with("Tests section has only 1 test cases"));
    }

    #[test]
    fn test_legacy_tests_section() {
        let spec = "## Tests\n- [ ] valid\n- [x] invalid\n- [ ] empty\n";
        assert_eq!(check_tests(spec, 3), None);

        let spec = "## Tests\n- [ ] valid\n- [x] invalid\n";
        let msg = check_tests(spec, 3).unwrap();
        assert!(msg.starts_with("Tests section has only 2 test cases (minimum: 3)!"));
    }

    #[test]
    fn test_missing_tests_section_denied() {
        let msg = check_tests("# spec\n", 4).unwrap();
        assert!(msg.starts_with("Spec missing Eval Criteria or Tests section!"));
        assert!(msg.contains("at least 4 criteria"));
    }

    #[test]
    fn test_tests_check_can_be_disabled() {
        let mut repo = Repo::new();
        repo.config.enforcement.require_tests_in_spec = false;
        assert_eq!(repo.validate(&format!("{IMPACT_DONE}{PLAN}")), None);
    }
}
