/// Pronoun and identity substitution for authored text.
///
/// Recognized tokens: `{he}` `{him}` `{his}` `{himself}` (and their
/// capitalized forms), `{Name}`, `{Title}`. Anything else between braces is
/// left exactly as written.
use serde::{Deserialize, Serialize};

/// The hero's birth, which decides the pronoun family used in text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BirthChoice {
    Boy,
    Girl,
    ChildOfOmen,
}

impl BirthChoice {
    pub fn pronouns(&self) -> Pronouns {
        match self {
            Self::Boy => Pronouns::HeHim,
            Self::Girl => Pronouns::SheHer,
            Self::ChildOfOmen => Pronouns::TheyThem,
        }
    }
}

/// Pronoun family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pronouns {
    /// he/him/his/himself
    HeHim,
    /// she/her/her/herself
    SheHer,
    /// they/them/their/themselves
    TheyThem,
}

impl Pronouns {
    /// Nominative/subject form: "he", "she", "they".
    pub fn subject(&self) -> &'static str {
        match self {
            Self::HeHim => "he",
            Self::SheHer => "she",
            Self::TheyThem => "they",
        }
    }

    /// Accusative/object form: "him", "her", "them".
    pub fn object(&self) -> &'static str {
        match self {
            Self::HeHim => "him",
            Self::SheHer => "her",
            Self::TheyThem => "them",
        }
    }

    /// Possessive determiner: "his", "her", "their".
    pub fn possessive(&self) -> &'static str {
        match self {
            Self::HeHim => "his",
            Self::SheHer => "her",
            Self::TheyThem => "their",
        }
    }

    /// Reflexive: "himself", "herself", "themselves".
    pub fn reflexive(&self) -> &'static str {
        match self {
            Self::HeHim => "himself",
            Self::SheHer => "herself",
            Self::TheyThem => "themselves",
        }
    }
}

/// The birth-choice/name/title triple used when rendering authored text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateContext {
    pub birth_choice: BirthChoice,
    pub name: String,
    pub title: String,
}

impl TemplateContext {
    pub fn new(
        birth_choice: BirthChoice,
        name: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            birth_choice,
            name: name.into(),
            title: title.into(),
        }
    }

    pub fn render(&self, text: &str) -> String {
        render(text, self.birth_choice, &self.name, &self.title)
    }
}

impl Default for TemplateContext {
    /// Neutral pronouns; `{Name}` and `{Title}` are kept as literal tokens so
    /// content compiled before character creation can still be inspected.
    fn default() -> Self {
        Self::new(BirthChoice::ChildOfOmen, "{Name}", "{Title}")
    }
}

/// Substitute pronoun and identity tokens in `text`.
pub fn render(text: &str, birth_choice: BirthChoice, name: &str, title: &str) -> String {
    let pronouns = birth_choice.pronouns();
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let token_len = after
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(after.len());

        if token_len > 0 && after[token_len..].starts_with('}') {
            let token = &after[..token_len];
            match resolve_token(token, pronouns, name, title) {
                Some(value) => out.push_str(&value),
                None => {
                    out.push('{');
                    out.push_str(token);
                    out.push('}');
                }
            }
            rest = &after[token_len + 1..];
        } else {
            out.push('{');
            rest = after;
        }
    }

    out.push_str(rest);
    out
}

fn resolve_token(token: &str, pronouns: Pronouns, name: &str, title: &str) -> Option<String> {
    let value = match token {
        "he" => pronouns.subject().to_string(),
        "He" => capitalize(pronouns.subject()),
        "him" => pronouns.object().to_string(),
        "Him" => capitalize(pronouns.object()),
        "his" => pronouns.possessive().to_string(),
        "His" => capitalize(pronouns.possessive()),
        "himself" => pronouns.reflexive().to_string(),
        "Himself" => capitalize(pronouns.reflexive()),
        "Name" => name.to_string(),
        "Title" => title.to_string(),
        _ => return None,
    };
    Some(value)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_feminine_pronouns_and_name() {
        let text = render(
            "{He} is {Name}, {His} sword gleams.",
            BirthChoice::Girl,
            "Astrid",
            "Jarl",
        );
        assert_eq!(text, "She is Astrid, Her sword gleams.");
    }

    #[test]
    fn renders_every_token_for_boy() {
        let text = render(
            "{he} {He} {him} {Him} {his} {His} {himself} {Himself} {Title}",
            BirthChoice::Boy,
            "Ivar",
            "the Boneless",
        );
        assert_eq!(text, "he He him Him his His himself Himself the Boneless");
    }

    #[test]
    fn child_of_omen_uses_they_family() {
        let text = render("{He} steeled {himself}.", BirthChoice::ChildOfOmen, "", "");
        assert_eq!(text, "They steeled themselves.");
    }

    #[test]
    fn unknown_tokens_are_left_verbatim() {
        let text = render("{she} said {{x}} and {Unknown}", BirthChoice::Boy, "A", "B");
        assert_eq!(text, "{she} said {{x}} and {Unknown}");
    }

    #[test]
    fn stray_braces_are_not_errors() {
        assert_eq!(render("a { b } {", BirthChoice::Girl, "", ""), "a { b } {");
        assert_eq!(render("{}{He}", BirthChoice::Girl, "", ""), "{}She");
        assert_eq!(render("{{He}}", BirthChoice::Girl, "", ""), "{She}");
    }

    #[test]
    fn default_context_keeps_identity_tokens() {
        let ctx = TemplateContext::default();
        assert_eq!(ctx.render("{Name} the {Title}"), "{Name} the {Title}");
        assert_eq!(ctx.render("{his}"), "their");
    }

    #[test]
    fn capitalize_only_touches_first_char() {
        assert_eq!(capitalize("themselves"), "Themselves");
        assert_eq!(capitalize(""), "");
    }
}
