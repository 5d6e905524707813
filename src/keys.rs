//! Key specs, bindable actions and key help.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::error::{Error, Result};
use crate::surface::Surface;
use crate::tree::DiffType;

/// Everything a key can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    ToggleView,
    FilterFiles,

    CursorUp,
    CursorDown,
    CursorLeft,
    CursorRight,
    PageUp,
    PageDown,

    ToggleCollapseDir,
    ToggleCollapseAllDir,
    ToggleSortOrder,
    ExtractFile,
    ToggleDiffType(DiffType),
    ToggleAttributes,
    ToggleWrapTree,
}

/// A key code plus modifiers, comparable with incoming key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPress {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyPress {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Parse one key such as `ctrl+space`, `pgdn` or `k`.
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::KeyBinding {
            binding: spec.to_string(),
            reason: reason.to_string(),
        };

        let spec = spec.trim();
        if spec.is_empty() {
            return Err(invalid("empty key"));
        }

        let mut modifiers = KeyModifiers::NONE;
        let mut parts: Vec<&str> = spec.split('+').collect();
        // a lone "+" or a trailing "ctrl++" names the plus key itself
        if spec.ends_with("++") || spec == "+" {
            parts.retain(|p| !p.is_empty());
            parts.push("+");
        }
        let Some(key) = parts.pop() else {
            return Err(invalid("empty key"));
        };

        for modifier in parts {
            modifiers |= match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => KeyModifiers::CONTROL,
                "alt" => KeyModifiers::ALT,
                "shift" => KeyModifiers::SHIFT,
                other => return Err(invalid(&format!("unknown modifier {other:?}"))),
            };
        }

        let code = match key.to_ascii_lowercase().as_str() {
            "space" => KeyCode::Char(' '),
            "enter" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "esc" | "escape" => KeyCode::Esc,
            "backspace" => KeyCode::Backspace,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "pgup" | "pageup" => KeyCode::PageUp,
            "pgdn" | "pagedown" => KeyCode::PageDown,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            lower if lower.len() > 1 && lower.starts_with('f') => {
                let n: u8 = lower[1..]
                    .parse()
                    .map_err(|_| invalid("unknown key name"))?;
                KeyCode::F(n)
            }
            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => KeyCode::Char(ch.to_ascii_lowercase()),
                    _ => return Err(invalid("unknown key name")),
                }
            }
        };

        Ok(Self { code, modifiers })
    }

    /// Parse a comma separated list of alternatives.
    pub fn parse_list(spec: &str) -> Result<Vec<Self>> {
        spec.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Self::parse)
            .collect()
    }

    pub fn from_event(event: KeyEvent) -> Self {
        let mut modifiers = event.modifiers;
        let code = match event.code {
            // terminals report shifted letters as uppercase chars
            KeyCode::Char(ch) => {
                modifiers.remove(KeyModifiers::SHIFT);
                KeyCode::Char(ch.to_ascii_lowercase())
            }
            other => other,
        };
        Self { code, modifiers }
    }

    /// Short label used in key help, e.g. `^Space` or `PgDn`.
    pub fn label(&self) -> String {
        let key = match self.code {
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(ch) if self.modifiers.contains(KeyModifiers::CONTROL) => {
                ch.to_ascii_uppercase().to_string()
            }
            KeyCode::Char(ch) => ch.to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Backspace => "Bksp".to_string(),
            KeyCode::Up => "↑".to_string(),
            KeyCode::Down => "↓".to_string(),
            KeyCode::Left => "←".to_string(),
            KeyCode::Right => "→".to_string(),
            KeyCode::PageUp => "PgUp".to_string(),
            KeyCode::PageDown => "PgDn".to_string(),
            KeyCode::Home => "Home".to_string(),
            KeyCode::End => "End".to_string(),
            KeyCode::F(n) => format!("F{n}"),
            other => format!("{other:?}"),
        };

        let mut label = String::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            label.push('^');
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            label.push_str("M-");
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            label.push_str("S-");
        }
        label.push_str(&key);
        label
    }
}

/// What a pane asks to bind during setup.
#[derive(Debug, Clone)]
pub struct BindingInfo<'a> {
    pub config: &'a str,
    pub action: Action,
    /// Label shown in the key help; bindings without one are not listed.
    pub display: Option<&'static str>,
}

impl<'a> BindingInfo<'a> {
    /// A binding listed in the key help.
    pub fn shown(config: &'a str, action: Action, display: &'static str) -> Self {
        Self {
            config,
            action,
            display: Some(display),
        }
    }

    pub fn hidden(config: &'a str, action: Action) -> Self {
        Self {
            config,
            action,
            display: None,
        }
    }
}

/// A registered binding that appears in key help.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub keys: Vec<KeyPress>,
    pub action: Action,
    pub display: &'static str,
}

impl Binding {
    /// Help entry such as `^A [x] Added`; `selected` is `None` for plain actions.
    pub fn render_key_help(&self, selected: Option<bool>) -> String {
        let key = self
            .keys
            .first()
            .map(KeyPress::label)
            .unwrap_or_default();
        match selected {
            Some(true) => format!("{key} [x] {} ", self.display),
            Some(false) => format!("{key} [ ] {} ", self.display),
            None => format!("{key} {} ", self.display),
        }
    }
}

/// Register `infos` for `region` and return the ones shown in key help.
pub fn generate_bindings(
    surface: &mut dyn Surface,
    region: Option<&str>,
    infos: &[BindingInfo<'_>],
) -> Result<Vec<Binding>> {
    let mut help = Vec::new();
    for info in infos {
        let keys = KeyPress::parse_list(info.config)?;
        for key in &keys {
            surface.bind(region, *key, info.action)?;
        }
        if let Some(display) = info.display {
            help.push(Binding {
                keys,
                action: info.action,
                display,
            });
        }
    }
    Ok(help)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keys() {
        assert_eq!(
            KeyPress::parse("ctrl+space").unwrap(),
            KeyPress::new(KeyCode::Char(' '), KeyModifiers::CONTROL)
        );
        assert_eq!(
            KeyPress::parse("PgDn").unwrap(),
            KeyPress::new(KeyCode::PageDown, KeyModifiers::NONE)
        );
        assert_eq!(
            KeyPress::parse("ctrl+A").unwrap(),
            KeyPress::new(KeyCode::Char('a'), KeyModifiers::CONTROL)
        );
        assert_eq!(
            KeyPress::parse("f5").unwrap(),
            KeyPress::new(KeyCode::F(5), KeyModifiers::NONE)
        );
        assert_eq!(
            KeyPress::parse("f").unwrap(),
            KeyPress::new(KeyCode::Char('f'), KeyModifiers::NONE)
        );
        assert_eq!(
            KeyPress::parse("ctrl++").unwrap(),
            KeyPress::new(KeyCode::Char('+'), KeyModifiers::CONTROL)
        );
    }

    #[test]
    fn test_parse_list() {
        let keys = KeyPress::parse_list("up, k").unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[1].code, KeyCode::Char('k'));
    }

    #[test]
    fn test_parse_errors() {
        assert!(KeyPress::parse("hyper+a").is_err());
        assert!(KeyPress::parse("banana").is_err());
        assert!(KeyPress::parse("").is_err());
    }

    #[test]
    fn test_from_event_matches_parsed_key() {
        let event = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL);
        assert_eq!(
            KeyPress::from_event(event),
            KeyPress::parse("ctrl+a").unwrap()
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(KeyPress::parse("ctrl+space").unwrap().label(), "^Space");
        assert_eq!(KeyPress::parse("ctrl+a").unwrap().label(), "^A");
        assert_eq!(KeyPress::parse("pgup").unwrap().label(), "PgUp");
        assert_eq!(KeyPress::parse("tab").unwrap().label(), "Tab");
    }

    #[test]
    fn test_render_key_help() {
        let binding = Binding {
            keys: KeyPress::parse_list("ctrl+a").unwrap(),
            action: Action::ToggleDiffType(DiffType::Added),
            display: "Added",
        };
        assert_eq!(binding.render_key_help(Some(true)), "^A [x] Added ");
        assert_eq!(binding.render_key_help(Some(false)), "^A [ ] Added ");
        assert_eq!(binding.render_key_help(None), "^A Added ");
    }
}
