//! System prompt templates.
//!
//! Each WebSocket endpoint speaks through one assistant persona. Templates
//! carry a `{chat_history}` placeholder for the rendered session transcript
//! and, for the learning personas, a `{rag_document}` placeholder for
//! reference material.

use serde::{Deserialize, Serialize};

/// Placeholder replaced by the rendered session transcript.
pub const HISTORY_PLACEHOLDER: &str = "{chat_history}";

/// Placeholder replaced by retrieved reference material.
pub const DOCUMENT_PLACEHOLDER: &str = "{rag_document}";

const CHAT_TEMPLATE: &str = "
Tu es PSG Fan Assistant. Aide les utilisateurs avec:
* Prédictions de matchs
* Règles du jeu de prédiction et Heatmap
* Statistiques des joueurs et de l'équipe
* Engagement sur la plateforme

Sois enthousiaste, positif et adapte ton niveau de détail. Soutiens les équipes masculines et féminines du PSG.

{chat_history}

Important: Ne jamais encourager les paris irresponsables. Évite les questions hors-sujet.
";

const COURSE_TEMPLATE: &str = "
Tu es PSG Fan Assistant. Informe clairement sur:
* Règles du football et statistiques
* Histoire et actualités du PSG
* Fonctionnement des jeux de prédiction et Heatmap
* Stratégies pour faire de bonnes prédictions

Sois enthousiaste, organisé et accessible. Mentionne l'impact social de la plateforme.

{chat_history}

Important: Ne jamais encourager les paris irresponsables.

Ressources: {rag_document}
";

const EVALUATION_TEMPLATE: &str = "
Tu es PSG Fan Assistant. Évalue les connaissances avec:
* Quiz sur le PSG et ses joueurs
* Questions sur les matchs récents et historiques
* Scénarios de prédiction
* Conseils adaptés au niveau de l'utilisateur

Sois encourageant et adapte la difficulté selon le niveau démontré.

{chat_history}

Important: Ne jamais encourager les paris irresponsables.

Ressources: {rag_document}
";

/// The assistant personas served by the endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// General fan assistant, the only persona with voice support.
    Chat,
    /// Explains rules, history and prediction strategies.
    Course,
    /// Quizzes the user.
    Evaluation,
}

impl PromptKind {
    /// All personas.
    pub const ALL: [PromptKind; 3] = [Self::Chat, Self::Course, Self::Evaluation];

    /// Returns the built-in template for this persona.
    #[must_use]
    pub fn template(&self) -> PromptTemplate {
        let content = match self {
            Self::Chat => CHAT_TEMPLATE,
            Self::Course => COURSE_TEMPLATE,
            Self::Evaluation => EVALUATION_TEMPLATE,
        };
        PromptTemplate::new(self.name(), content)
    }

    /// Returns the persona name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Course => "course",
            Self::Evaluation => "evaluation",
        }
    }
}

/// A system prompt with history and document placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Template name (used for lookup and logging).
    pub name: String,
    /// Template content with placeholders.
    pub content: String,
}

impl PromptTemplate {
    /// Creates a new prompt template.
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Returns true if the template has a history placeholder.
    #[must_use]
    pub fn expects_history(&self) -> bool {
        self.content.contains(HISTORY_PLACEHOLDER)
    }

    /// Substitutes the transcript and reference document.
    ///
    /// Substitution is single-pass: placeholder text inside the inserted
    /// values is left untouched.
    #[must_use]
    pub fn render(&self, history: &str, rag_document: &str) -> String {
        let values: [(&str, &str); 2] = [
            (HISTORY_PLACEHOLDER, history),
            (DOCUMENT_PLACEHOLDER, rag_document),
        ];

        let mut result = String::with_capacity(self.content.len() + history.len());
        let mut rest = self.content.as_str();
        while let Some(start) = rest.find('{') {
            result.push_str(&rest[..start]);
            let tail = &rest[start..];
            match values
                .iter()
                .find(|&&(placeholder, _)| tail.starts_with(placeholder))
            {
                Some(&(placeholder, value)) => {
                    result.push_str(value);
                    rest = &tail[placeholder.len()..];
                }
                None => {
                    result.push('{');
                    rest = &tail[1..];
                }
            }
        }
        result.push_str(rest);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_history() {
        let template = PromptTemplate::new("t", "Before\n{chat_history}\nAfter");
        assert_eq!(
            template.render("User: Bonjour", ""),
            "Before\nUser: Bonjour\nAfter"
        );
    }

    #[test]
    fn render_with_empty_history_leaves_nothing() {
        let template = PromptTemplate::new("t", "A{chat_history}B");
        assert_eq!(template.render("", ""), "AB");
    }

    #[test]
    fn render_substitutes_document() {
        let template = PromptTemplate::new("t", "{chat_history}|{rag_document}");
        assert_eq!(template.render("h", "doc"), "h|doc");
    }

    #[test]
    fn render_does_not_expand_placeholders_inside_history() {
        let template = PromptTemplate::new("t", "{chat_history} / {rag_document}");
        assert_eq!(
            template.render("User: what is {rag_document}?", "D"),
            "User: what is {rag_document}? / D"
        );
    }

    #[test]
    fn render_keeps_unknown_braces() {
        let template = PromptTemplate::new("t", "{unknown} {chat_history} {");
        assert_eq!(template.render("h", ""), "{unknown} h {");
    }

    #[test]
    fn built_in_templates_expect_history() {
        for kind in PromptKind::ALL {
            let template = kind.template();
            assert!(template.expects_history(), "{} lacks history", kind.name());
            assert_eq!(template.name, kind.name());
        }
    }

    #[test]
    fn learning_templates_take_documents() {
        assert!(!PromptKind::Chat.template().content.contains(DOCUMENT_PLACEHOLDER));
        assert!(PromptKind::Course.template().content.contains(DOCUMENT_PLACEHOLDER));
        assert!(PromptKind::Evaluation.template().content.contains(DOCUMENT_PLACEHOLDER));
    }

    #[test]
    fn rendered_chat_template_contains_transcript() {
        let rendered = PromptKind::Chat
            .template()
            .render("User: Bonjour\n\nAssistant: Salut!", "");
        assert!(rendered.contains("Assistant: Salut!"));
        assert!(!rendered.contains(HISTORY_PLACEHOLDER));
    }
}
