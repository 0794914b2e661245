//! Chat reply texts.
//!
//! Replies use the chat platform's lightweight markup (`*bold*`, backticks).

use jarvis_core::types::{CreatedIssue, IssueDraft};

use crate::error::ChatError;

/// Renders every reply the engine posts.
#[derive(Debug, Clone)]
pub struct Replies {
    /// How users address the bot, e.g. `jarvis`.
    handle: String,
    prefix: String,
    base_url: String,
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "—"
    } else {
        value
    }
}

impl Replies {
    pub fn new(bot_name: &str, prefix: &str, base_url: &str) -> Self {
        Self {
            handle: bot_name.trim().to_lowercase(),
            prefix: prefix.trim().to_lowercase(),
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    fn confirm_hint(&self) -> String {
        format!(
            "Se estiver ok, responda: `{}: confirmar`\nSe quiser descartar: `{}: cancelar card`",
            self.handle, self.handle
        )
    }

    /// Ask for the missing project and/or type of a draft.
    pub fn missing_fields(&self, draft: &IssueDraft) -> String {
        let mut missing = Vec::new();
        if draft.needs_project() {
            missing.push("projeto");
        }
        if draft.needs_type() {
            missing.push("tipo");
        }

        let mut msg = String::from("Preciso de mais informações para criar o card.\n\n");
        if !missing.is_empty() {
            msg.push_str(&format!("Faltando: *{}*\n\n", missing.join(" e ")));
        }
        msg.push_str(&format!(
            "*Resumo:* {}\n*Projeto:* {}\n*Tipo:* {}\n\n",
            or_dash(&draft.summary),
            or_dash(&draft.project),
            or_dash(&draft.issue_type)
        ));
        msg.push_str("Responda com:\n");
        msg.push_str(&format!(
            "`{}: {} definir | projeto=ABC | tipo=Bug`",
            self.handle, self.prefix
        ));
        msg
    }

    pub fn preview(&self, draft: &IssueDraft, with_hint: bool) -> String {
        let mut msg = String::from("🧾 *Prévia do card:*\n\n");
        msg.push_str(&format!("*Projeto:* {}\n", or_dash(&draft.project)));
        msg.push_str(&format!("*Tipo:* {}\n", or_dash(&draft.issue_type)));
        msg.push_str(&format!("*Resumo:* {}\n\n", or_dash(&draft.summary)));
        if with_hint {
            msg.push_str(&self.confirm_hint());
        }
        msg
    }

    /// Numbered preview of a multi-card queue, always with the hint.
    pub fn multi_preview(&self, drafts: &[IssueDraft]) -> String {
        let mut msg = format!("🧾 *Prévia dos {} cards:*\n\n", drafts.len());
        for (i, draft) in drafts.iter().enumerate() {
            msg.push_str(&format!("*Card {}*\n", i + 1));
            msg.push_str(&format!("*Projeto:* {}\n", or_dash(&draft.project)));
            msg.push_str(&format!("*Tipo:* {}\n", or_dash(&draft.issue_type)));
            msg.push_str(&format!("*Resumo:* {}\n\n", or_dash(&draft.summary)));
        }
        msg.push_str(&self.confirm_hint());
        msg
    }

    pub fn created(&self, issue: &CreatedIssue) -> String {
        if self.base_url.is_empty() {
            format!("Card criado ✅ *{}*", issue.key)
        } else {
            format!(
                "Card criado ✅ *{}*\n{}/browse/{}",
                issue.key, self.base_url, issue.key
            )
        }
    }

    pub fn create_failed(&self, err: &ChatError) -> String {
        let detail = match err {
            ChatError::ExternalService(msg) => msg.clone(),
            other => other.to_string(),
        };
        format!("Não consegui criar o card no Jira: {}", detail)
    }

    pub fn nothing_to_confirm(&self) -> String {
        "Não encontrei nenhum rascunho pendente para confirmar neste thread.".to_string()
    }

    pub fn cancelled(&self) -> String {
        "Ok — rascunho pendente descartado.".to_string()
    }

    pub fn extraction_failed(&self, multi: bool, err: &ChatError) -> String {
        let what = if multi {
            "os rascunhos dos cards"
        } else {
            "o rascunho do card"
        };
        let detail = match err {
            ChatError::ExternalService(msg) => msg.clone(),
            other => other.to_string(),
        };
        format!("Não consegui montar {} a partir da thread: {}", what, detail)
    }

    /// Reply for user-facing errors that need no draft context.
    pub fn for_error(&self, err: &ChatError) -> String {
        match err {
            ChatError::EmptyMessage => "Mensagem vazia.".to_string(),
            ChatError::MissingFields {
                project,
                issue_type,
            } => {
                let draft = IssueDraft {
                    project: if *project { String::new() } else { "?".into() },
                    issue_type: if *issue_type { String::new() } else { "?".into() },
                    ..IssueDraft::default()
                };
                self.missing_fields(&draft)
            }
            ChatError::InvalidDefine => format!(
                "Não consegui ler `projeto=` e/ou `tipo=`. Exemplo: `{}: {} definir | projeto=PROJ | tipo=Bug`",
                self.handle, self.prefix
            ),
            ChatError::NoPendingDraft => format!(
                "Não encontrei nenhum rascunho pendente neste thread. Peça: `{}: com base nessa thread crie um card no jira`.",
                self.handle
            ),
            ChatError::CreationDisabled => {
                "Criação de issues no Jira está desabilitada.".to_string()
            }
            ChatError::ExternalService(_) => self.create_failed(err),
        }
    }
}

/// Clip to `max` characters, appending an ellipsis when anything was cut.
pub fn clip(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max).collect();
    clipped.push('…');
    clipped
}
