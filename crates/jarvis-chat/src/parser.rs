//! Deterministic command parser.
//!
//! Recognizes the explicit pipe-delimited commands (`criar`, `definir`,
//! `confirmar`, `cancelar`), the keyword pre-filters for natural-language
//! creation requests, and the best-effort field extraction used to fill a
//! draft from free text. Everything here is pure: no I/O, no shared state.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use jarvis_core::types::IssueDraft;

/// Longest summary kept from free text, in characters.
const MAX_SUMMARY_CHARS: usize = 140;

// =============================================================================
// Compiled patterns
// =============================================================================

static PRIORITY_EXTRA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bpriority=([^ |\n\t]+)").unwrap());

static LABELS_EXTRA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blabels=([^ |\n\t]+)").unwrap());

static PROJECT_OF_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:projeto|prefixo|project)\s+(?:do|da|de|of|the)\s+(\w+)\b").unwrap()
});

static EXPLICIT_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?i:prefixo|projeto|project)\s*[:=]?\s*([A-Z][A-Z0-9]+)\b").unwrap()
});

static ROADMAP_OF_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?i:roadmap)\s+(?i:do|da|de)\s+([A-Z][A-Z0-9]+)\b").unwrap());

static ROADMAP_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?i:roadmap)\s+([A-Z][A-Z0-9]+)\b").unwrap());

static QUOTED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]+)""#).unwrap());

static TITLE_FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:título|titulo|title)\s*[:=]\s*(.+)$").unwrap());

static TITLE_TAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*[.,]\s*(?:do\s+tipo|tipo|no\s+projeto|projeto|prefixo|board)\b.*$")
        .unwrap()
});

static ISSUE_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z][A-Z0-9]+-\d+)\b").unwrap());

/// Tokens that look like keys after "projeto" but never are.
const NON_KEY_TOKENS: &[&str] = &["V2", "DO", "DA", "DE"];

const CREATE_VERBS: &[&str] = &["crie", "cria", "criar", "abra", "abre", "abrir"];

const ARTIFACT_NOUNS: &[&str] = &[
    "card", "ticket", "issue", "história", "historia", "bug", "épico", "epico", "tarefa",
];

const DESTINATION_PHRASES: &[&str] = &[" no jira", " no projeto", " no portal"];

const THREAD_PHRASES: &[&str] = &[
    "com base nessa thread",
    "com base na thread",
    "baseado nessa thread",
    "baseado na thread",
    "baseada nessa thread",
    "baseada na thread",
    "a partir dessa thread",
    "a partir da thread",
    "dessa thread",
    "nessa thread",
];

const MULTI_CARD_PHRASES: &[&str] = &[
    "dois card",
    "duas card",
    "dois ticket",
    "duas ticket",
    "dois issue",
    "duas issue",
    "três card",
    "tres card",
    "múltiplos card",
    "multiplos card",
    "vários card",
    "varios card",
];

// =============================================================================
// InlineExtras
// =============================================================================

/// Fields pulled out of a description written inline
/// (`... priority=High labels=a,b ...`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineExtras {
    pub priority: Option<String>,
    pub labels: Vec<String>,
    /// Description with the extracted tokens removed.
    pub description: String,
}

/// Scan a description for `priority=VALUE` and `labels=a,b` tokens.
///
/// Matching is case-insensitive and a value ends at the next space, pipe,
/// newline or tab. Matched tokens are removed from the returned description,
/// which is then trimmed of stray pipes and spaces.
pub fn extract_inline_extras(description: &str) -> InlineExtras {
    let mut clean = description.trim().to_string();
    if clean.is_empty() {
        return InlineExtras::default();
    }

    let mut priority = None;
    if let Some(caps) = PRIORITY_EXTRA_RE.captures(&clean) {
        priority = Some(caps[1].to_string());
        let range = caps.get(0).map(|m| m.range()).unwrap_or_default();
        clean.replace_range(range, "");
    }

    let mut labels = Vec::new();
    if let Some(caps) = LABELS_EXTRA_RE.captures(&clean) {
        labels = split_csv(&caps[1]);
        let range = caps.get(0).map(|m| m.range()).unwrap_or_default();
        clean.replace_range(range, "");
    }

    let clean = clean.replace("  ", " ");
    InlineExtras {
        priority,
        labels,
        description: clean.trim_matches(|c| c == ' ' || c == '|').trim().to_string(),
    }
}

/// Split a comma-separated value into trimmed, non-empty, distinct entries.
pub fn split_csv(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if !out.iter().any(|seen| seen == part) {
            out.push(part.to_string());
        }
    }
    out
}

/// First issue key (`ABC-123`) mentioned in the text, upper-cased.
pub fn extract_issue_key(text: &str) -> Option<String> {
    let upper = text.to_uppercase();
    ISSUE_KEY_RE.captures(&upper).map(|c| c[1].to_string())
}

/// Normalize a free-text title: drop trailing "tipo/projeto/board" clauses,
/// collapse whitespace, strip trailing dots and cap the length.
pub fn clean_title(raw: &str) -> String {
    let stripped = TITLE_TAIL_RE.replace(raw.trim(), "");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(collapsed.trim_end_matches(['.', ' ']), MAX_SUMMARY_CHARS)
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Case-insensitive prefix strip that never splits a character.
fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    (head.to_lowercase() == prefix.to_lowercase()).then(|| &text[prefix.len()..])
}

/// True when `phrase` occurs in `haystack` delimited by non-alphanumerics.
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(start, m)| {
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = haystack[start + m.len()..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

fn has_create_verb(low: &str) -> bool {
    CREATE_VERBS.iter().any(|v| low.contains(v))
}

// =============================================================================
// CommandParser
// =============================================================================

/// Parser for the chat command surface.
///
/// The command prefix (`jira` by default) and the project alias map are
/// injected at construction so two parsers with different settings can
/// coexist in one process.
#[derive(Debug, Clone)]
pub struct CommandParser {
    prefix: String,
    /// Lower-case human project name to project key.
    aliases: BTreeMap<String, String>,
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new("jira", BTreeMap::new())
    }
}

impl CommandParser {
    pub fn new(prefix: impl Into<String>, aliases: BTreeMap<String, String>) -> Self {
        let prefix = prefix.into().trim().to_lowercase();
        let aliases = aliases
            .into_iter()
            .map(|(name, key)| (name.trim().to_lowercase(), key.trim().to_uppercase()))
            .filter(|(name, key)| !name.is_empty() && !key.is_empty())
            .collect();
        Self { prefix, aliases }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    // -----------------------------------------------------------------
    // Explicit commands
    // -----------------------------------------------------------------

    /// Parse `<prefix> criar | PROJECT | TYPE | SUMMARY | DESCRIPTION...`.
    ///
    /// Returns `None` when the text is not a create command. With fewer than
    /// three pipe-delimited segments the whole remainder becomes the summary
    /// and project/type stay empty.
    pub fn parse_explicit_create(&self, text: &str) -> Option<IssueDraft> {
        let rest = strip_prefix_ci(text.trim(), &format!("{} criar", self.prefix))?.trim();
        // The pipe right after the verb separates it from the first field.
        let rest = rest.strip_prefix('|').unwrap_or(rest).trim();
        let parts: Vec<&str> = rest.split('|').map(str::trim).collect();
        if parts.len() < 3 {
            return Some(IssueDraft::with_summary(rest));
        }

        let description = parts[3..].join(" | ");
        let extras = extract_inline_extras(description.trim());
        Some(IssueDraft {
            project: parts[0].to_string(),
            issue_type: parts[1].to_string(),
            summary: parts[2].to_string(),
            description: extras.description,
            priority: extras.priority,
            labels: extras.labels,
        })
    }

    /// Whether the text starts with `<prefix> definir` or `<prefix> set`.
    pub fn is_define_command(&self, text: &str) -> bool {
        self.define_body(text).is_some()
    }

    fn define_body<'a>(&self, text: &'a str) -> Option<&'a str> {
        let t = text.trim();
        strip_prefix_ci(t, &format!("{} definir", self.prefix))
            .or_else(|| strip_prefix_ci(t, &format!("{} set", self.prefix)))
    }

    /// Apply `<prefix> definir | key=value | ...` to a draft in place.
    ///
    /// Known keys: `projeto`/`project`, `tipo`/`type`,
    /// `titulo`/`título`/`summary`, `prioridade`/`priority`,
    /// `labels`/`label` (comma separated). Unknown keys are ignored.
    /// Returns true iff at least one key was applied.
    pub fn apply_define(&self, text: &str, draft: &mut IssueDraft) -> bool {
        let Some(body) = self.define_body(text) else {
            return false;
        };

        let mut updated = false;
        for segment in body.split('|').map(str::trim).filter(|s| !s.is_empty()) {
            let Some((key, value)) = segment.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim().to_lowercase().as_str() {
                "projeto" | "project" => draft.project = value.to_string(),
                "tipo" | "type" => draft.issue_type = value.to_string(),
                "titulo" | "título" | "summary" => draft.summary = value.to_string(),
                "prioridade" | "priority" => draft.priority = Some(value.to_string()),
                "labels" | "label" => draft.labels = split_csv(value),
                _ => continue,
            }
            updated = true;
        }
        updated
    }

    /// `confirmar` or `<prefix> confirmar`, optionally followed by more text.
    pub fn is_confirm_command(&self, text: &str) -> bool {
        let low = text.trim().to_lowercase();
        let prefixed = format!("{} confirmar", self.prefix);
        low == "confirmar" || low.starts_with("confirmar ") || low.starts_with(&prefixed)
    }

    /// Any text mentioning `cancelar` together with `card` or the prefix.
    pub fn is_cancel_command(&self, text: &str) -> bool {
        let low = text.to_lowercase();
        low.contains("cancelar") && (low.contains("card") || low.contains(&self.prefix))
    }

    // -----------------------------------------------------------------
    // Intent pre-filters
    // -----------------------------------------------------------------

    /// Keyword pre-filter for "create a card" requests.
    ///
    /// Matches a creation verb together with an artifact noun, a destination
    /// phrase ("no jira", "no projeto"), or a configured project name.
    pub fn looks_like_create_intent(&self, text: &str) -> bool {
        let low = text.trim().to_lowercase();
        if low.is_empty() || !has_create_verb(&low) {
            return false;
        }
        ARTIFACT_NOUNS.iter().any(|a| low.contains(a))
            || DESTINATION_PHRASES.iter().any(|p| low.contains(p))
            || self.aliases.keys().any(|name| contains_phrase(&low, name))
    }

    /// A thread-referential phrase plus a creation signal.
    pub fn is_thread_based_create(&self, text: &str) -> bool {
        let low = text.trim().to_lowercase();
        let creation_signal =
            has_create_verb(&low) || low.contains("card") || low.contains(&self.prefix);
        creation_signal && THREAD_PHRASES.iter().any(|p| low.contains(p))
    }

    /// Explicit plural requests ("crie dois cards", "um sobre X e outro Y").
    pub fn is_multi_card_create(&self, text: &str) -> bool {
        let low = text.trim().to_lowercase();
        MULTI_CARD_PHRASES.iter().any(|p| low.contains(p))
            || (low.contains("um sobre") && low.contains("outro"))
    }

    // -----------------------------------------------------------------
    // Field extraction
    // -----------------------------------------------------------------

    /// Best-effort project key from free text; empty when nothing matches.
    ///
    /// Precedence: configured aliases ("projeto do backend", "no backend"),
    /// then an explicit `projeto KEY`, then roadmap phrasings.
    pub fn parse_project_key(&self, text: &str) -> String {
        let text = text.trim();
        if text.is_empty() {
            return String::new();
        }
        let low = text.to_lowercase();

        if let Some(caps) = PROJECT_OF_NAME_RE.captures(text) {
            if let Some(key) = self.aliases.get(&caps[1].to_lowercase()) {
                return key.clone();
            }
        }

        let mentions_project = ["projeto", "prefixo", "project"]
            .iter()
            .any(|w| low.contains(w));
        if mentions_project {
            if let Some(key) = self
                .aliases
                .iter()
                .find(|(name, _)| contains_phrase(&low, name))
                .map(|(_, key)| key)
            {
                return key.clone();
            }
        }

        for (name, key) in &self.aliases {
            if ["no", "na", "em"]
                .iter()
                .any(|prep| contains_phrase(&low, &format!("{} {}", prep, name)))
            {
                return key.clone();
            }
        }

        if let Some(caps) = EXPLICIT_KEY_RE.captures(text) {
            return accept_key(&caps[1]);
        }

        if low.contains("roadmap") {
            if let Some(caps) = ROADMAP_OF_KEY_RE
                .captures(text)
                .or_else(|| ROADMAP_KEY_RE.captures(text))
            {
                return accept_key(&caps[1]);
            }
        }

        String::new()
    }

    /// Issue type named in free text; empty when none is recognized.
    pub fn parse_issue_type(&self, text: &str) -> String {
        let low = text.to_lowercase();
        let found = if ["épico", "epico", "epic"].iter().any(|w| low.contains(w)) {
            "Epic"
        } else if low.contains("história") || low.contains("historia") {
            "História"
        } else if low.contains("bug") {
            "Bug"
        } else if low.contains("subtarefa") {
            "Subtarefa"
        } else if low.contains("tarefa") {
            "Tarefa"
        } else if low.contains("spike") {
            "Spike"
        } else {
            ""
        };
        found.to_string()
    }

    /// Summary from quoted text or a `título: X` clause, capped at 140 chars.
    pub fn parse_summary(&self, text: &str) -> String {
        let text = text.trim();
        if text.is_empty() {
            return String::new();
        }
        let captured = QUOTED_RE
            .captures(text)
            .or_else(|| TITLE_FIELD_RE.captures(text))
            .map(|c| c[1].trim().to_string())
            .unwrap_or_default();
        truncate_chars(&captured, MAX_SUMMARY_CHARS)
    }
}

fn accept_key(raw: &str) -> String {
    let key = raw.trim().to_uppercase();
    if NON_KEY_TOKENS.contains(&key.as_str()) {
        String::new()
    } else {
        key
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> CommandParser {
        CommandParser::new(
            "jira",
            BTreeMap::from([
                ("backend".to_string(), "BE".to_string()),
                ("Operações".to_string(), "ops".to_string()),
            ]),
        )
    }

    // ---- parse_explicit_create ----

    #[test]
    fn test_explicit_create_full() {
        let draft = parser()
            .parse_explicit_create("jira criar | BE | Bug | Login falha | Ao clicar em entrar")
            .unwrap();
        assert_eq!(draft.project, "BE");
        assert_eq!(draft.issue_type, "Bug");
        assert_eq!(draft.summary, "Login falha");
        assert_eq!(draft.description, "Ao clicar em entrar");
        assert!(draft.priority.is_none());
    }

    #[test]
    fn test_explicit_create_rejoins_extra_segments() {
        let draft = parser()
            .parse_explicit_create("Jira Criar | BE | Bug | T | passo 1 | passo 2")
            .unwrap();
        assert_eq!(draft.description, "passo 1 | passo 2");
    }

    #[test]
    fn test_explicit_create_few_segments_is_summary() {
        let draft = parser()
            .parse_explicit_create("jira criar BE | corrigir export")
            .unwrap();
        assert_eq!(draft.summary, "BE | corrigir export");
        assert!(draft.project.is_empty());
        assert!(draft.issue_type.is_empty());
    }

    #[test]
    fn test_explicit_create_leading_pipe_leaves_project_empty() {
        let draft = parser().parse_explicit_create("jira criar | | Bug | Titulo").unwrap();
        assert!(draft.needs_project());
        assert_eq!(draft.issue_type, "Bug");
        assert_eq!(draft.summary, "Titulo");
    }

    #[test]
    fn test_explicit_create_extracts_inline_extras() {
        let draft = parser()
            .parse_explicit_create(
                "jira criar | BE | Bug | Titulo | Quebra no login priority=High labels=auth,web",
            )
            .unwrap();
        assert_eq!(draft.priority.as_deref(), Some("High"));
        assert_eq!(draft.labels, vec!["auth", "web"]);
        assert_eq!(draft.description, "Quebra no login");
    }

    #[test]
    fn test_explicit_create_not_matched() {
        assert!(parser().parse_explicit_create("crie um card").is_none());
        assert!(parser().parse_explicit_create("jira definir | tipo=Bug").is_none());
    }

    #[test]
    fn test_explicit_create_custom_prefix() {
        let p = CommandParser::new("Tracker", BTreeMap::new());
        let draft = p.parse_explicit_create("tracker criar | X | Y | Z").unwrap();
        assert_eq!(draft.project, "X");
        assert!(p.parse_explicit_create("jira criar | X | Y | Z").is_none());
    }

    // ---- extract_inline_extras ----

    #[test]
    fn test_inline_extras_case_insensitive_and_cleaned() {
        let extras = extract_inline_extras("PRIORITY=Low | texto principal | Labels=a, b");
        assert_eq!(extras.priority.as_deref(), Some("Low"));
        assert_eq!(extras.labels, vec!["a"]);
        assert_eq!(extras.description, "texto principal | b");
    }

    #[test]
    fn test_inline_extras_value_stops_at_pipe_and_newline() {
        let extras = extract_inline_extras("priority=High|resto\nlabels=x,y\nfim");
        assert_eq!(extras.priority.as_deref(), Some("High"));
        assert_eq!(extras.labels, vec!["x", "y"]);
        assert_eq!(extras.description, "resto\n\nfim");
    }

    #[test]
    fn test_inline_extras_empty() {
        assert_eq!(extract_inline_extras("   "), InlineExtras::default());
    }

    #[test]
    fn test_split_csv_dedupes_preserving_order() {
        assert_eq!(split_csv(" b, a ,, b,c "), vec!["b", "a", "c"]);
        assert!(split_csv("  ").is_empty());
    }

    // ---- apply_define ----

    #[test]
    fn test_apply_define_sets_type() {
        let mut draft = IssueDraft::with_summary("x");
        assert!(parser().apply_define("jira definir | tipo=Bug", &mut draft));
        assert_eq!(draft.issue_type, "Bug");
        assert!(!draft.needs_type());
    }

    #[test]
    fn test_apply_define_all_keys() {
        let mut draft = IssueDraft::default();
        let updated = parser().apply_define(
            "jira set | project=OPS | type=Tarefa | título=Novo título | prioridade=High | label=a,b | cor=azul",
            &mut draft,
        );
        assert!(updated);
        assert_eq!(draft.project, "OPS");
        assert_eq!(draft.issue_type, "Tarefa");
        assert_eq!(draft.summary, "Novo título");
        assert_eq!(draft.priority.as_deref(), Some("High"));
        assert_eq!(draft.labels, vec!["a", "b"]);
    }

    #[test]
    fn test_apply_define_without_pairs() {
        let mut draft = IssueDraft::with_summary("x");
        assert!(!parser().apply_define("jira definir projeto BE", &mut draft));
        assert!(!parser().apply_define("jira definir | cor=azul", &mut draft));
        assert_eq!(draft, IssueDraft::with_summary("x"));
    }

    #[test]
    fn test_apply_define_requires_prefix() {
        let mut draft = IssueDraft::default();
        assert!(!parser().apply_define("definir | tipo=Bug", &mut draft));
        assert!(parser().is_define_command("JIRA DEFINIR | tipo=Bug"));
        assert!(!parser().is_define_command("definir | tipo=Bug"));
    }

    // ---- confirm / cancel ----

    #[test]
    fn test_confirm_command() {
        let p = parser();
        assert!(p.is_confirm_command("confirmar"));
        assert!(p.is_confirm_command("  Confirmar por favor"));
        assert!(p.is_confirm_command("jira confirmar"));
        assert!(!p.is_confirm_command("confirmado"));
        assert!(!p.is_confirm_command("pode confirmar?"));
    }

    #[test]
    fn test_cancel_command() {
        let p = parser();
        assert!(p.is_cancel_command("cancelar card"));
        assert!(p.is_cancel_command("pode cancelar o jira"));
        assert!(!p.is_cancel_command("cancelar a reunião"));
    }

    // ---- intent pre-filters ----

    #[test]
    fn test_looks_like_create_intent() {
        let p = parser();
        assert!(p.looks_like_create_intent("Crie um card para o login"));
        assert!(p.looks_like_create_intent("abre um bug sobre isso"));
        assert!(p.looks_like_create_intent("cria isso no jira"));
        assert!(p.looks_like_create_intent("cria isso no backend"));
        assert!(!p.looks_like_create_intent("qual o status do card?"));
        assert!(!p.looks_like_create_intent(""));
    }

    #[test]
    fn test_thread_based_create() {
        let p = parser();
        assert!(p.is_thread_based_create("com base nessa thread crie um card"));
        assert!(p.is_thread_based_create("card a partir da thread"));
        assert!(!p.is_thread_based_create("resuma essa thread"));
        assert!(!p.is_thread_based_create("crie um card"));
    }

    #[test]
    fn test_multi_card_create() {
        let p = parser();
        assert!(p.is_multi_card_create("crie dois cards com base nessa thread"));
        assert!(p.is_multi_card_create("um sobre o login e outro sobre o export"));
        assert!(!p.is_multi_card_create("crie um card"));
    }

    // ---- field extraction ----

    #[test]
    fn test_project_key_from_alias_of_name() {
        assert_eq!(parser().parse_project_key("crie no projeto do backend"), "BE");
        assert_eq!(parser().parse_project_key("card no projeto de operações"), "OPS");
    }

    #[test]
    fn test_project_key_from_destination_preposition() {
        assert_eq!(parser().parse_project_key("abre um bug no backend"), "BE");
        assert_eq!(parser().parse_project_key("abre um bug no backendx"), "");
    }

    #[test]
    fn test_project_key_explicit() {
        let p = parser();
        assert_eq!(p.parse_project_key("crie um bug no projeto PAY"), "PAY");
        assert_eq!(p.parse_project_key("prefixo=INFRA2 por favor"), "INFRA2");
        assert_eq!(p.parse_project_key("projeto V2 do app"), "");
        assert_eq!(p.parse_project_key("projeto DE teste"), "");
    }

    #[test]
    fn test_project_key_roadmap() {
        let p = parser();
        assert_eq!(p.parse_project_key("itens do roadmap do CORE"), "CORE");
        assert_eq!(p.parse_project_key("roadmap DATA"), "DATA");
        assert_eq!(p.parse_project_key("roadmap V2"), "");
    }

    #[test]
    fn test_project_key_nothing() {
        assert_eq!(parser().parse_project_key("crie um card"), "");
        assert_eq!(parser().parse_project_key("   "), "");
    }

    #[test]
    fn test_issue_type() {
        let p = parser();
        assert_eq!(p.parse_issue_type("crie um épico"), "Epic");
        assert_eq!(p.parse_issue_type("uma historia nova"), "História");
        assert_eq!(p.parse_issue_type("abre um BUG"), "Bug");
        assert_eq!(p.parse_issue_type("crie uma subtarefa"), "Subtarefa");
        assert_eq!(p.parse_issue_type("crie uma tarefa"), "Tarefa");
        assert_eq!(p.parse_issue_type("spike de pesquisa"), "Spike");
        assert_eq!(p.parse_issue_type("crie um card"), "");
    }

    #[test]
    fn test_summary() {
        let p = parser();
        assert_eq!(p.parse_summary(r#"crie um bug "Export quebrado" no BE"#), "Export quebrado");
        assert_eq!(p.parse_summary("crie um card título: Ajustar login"), "Ajustar login");
        assert_eq!(p.parse_summary("crie um card"), "");
        let long = format!("\"{}\"", "é".repeat(200));
        assert_eq!(p.parse_summary(&long).chars().count(), 140);
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("  Ajustar   login.  "), "Ajustar login");
        assert_eq!(clean_title("Ajustar login, do tipo Bug no BE"), "Ajustar login");
        assert_eq!(clean_title(&"a".repeat(300)).len(), 140);
    }

    #[test]
    fn test_extract_issue_key() {
        assert_eq!(extract_issue_key("veja o be-123 ali").as_deref(), Some("BE-123"));
        assert_eq!(extract_issue_key("sem chave"), None);
    }
}
