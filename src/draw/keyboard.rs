use crate::draw::messages::Command;
use crate::draw::model::{Mode, Style, MAX_LINE_WIDTH, MAX_OPACITY, MIN_LINE_WIDTH};

pub const DEFAULT_ALPHA: u8 = 80;
const ALPHA_STEP: u8 = 5;
const MIN_SHORTCUT_ALPHA: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Escape,
    /// Key that produced a character, already shifted (`'+'`, `'R'`).
    Char(char),
    Other,
}

/// Shift is already folded into the character; only ctrl picks a shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyModifiers {
    pub ctrl: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    pub fn plain(key: KeyCode) -> Self {
        Self {
            key,
            modifiers: KeyModifiers::default(),
        }
    }

    pub fn ctrl(c: char) -> Self {
        Self {
            key: KeyCode::Char(c),
            modifiers: KeyModifiers { ctrl: true },
        }
    }
}

/// Result of a key press: commands for the bus plus a change of the text
/// capture flag, which the engine applies immediately.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyAction {
    pub commands: Vec<Command>,
    pub capture: Option<bool>,
}

impl KeyAction {
    fn command(command: Command) -> Self {
        Self {
            commands: vec![command],
            capture: None,
        }
    }
}

/// Maps a key press to bus commands.
///
/// Ctrl shortcuts always apply. While capturing, printable characters are
/// typed into the text buffer and plain shortcuts are suppressed.
pub fn map_key_event(event: KeyEvent, capturing: bool, style: &Style) -> KeyAction {
    if event.key == KeyCode::Escape {
        return KeyAction {
            commands: vec![Command::Mode(Mode::Pen)],
            capture: Some(false),
        };
    }
    let KeyCode::Char(c) = event.key else {
        return KeyAction::default();
    };

    if event.modifiers.ctrl {
        return match c {
            'l' | 'L' => KeyAction {
                commands: vec![Command::Mode(Mode::Text)],
                capture: Some(true),
            },
            'z' | 'Z' => KeyAction::command(Command::Undo),
            'w' | 'W' => KeyAction::command(Command::Wipe),
            '+' => KeyAction::command(Command::Alpha(
                style.opacity.saturating_add(ALPHA_STEP).min(MAX_OPACITY),
            )),
            '-' => KeyAction::command(Command::Alpha(
                style
                    .opacity
                    .saturating_sub(ALPHA_STEP)
                    .max(MIN_SHORTCUT_ALPHA),
            )),
            'r' | 'R' => KeyAction::command(Command::Alpha(DEFAULT_ALPHA)),
            _ => KeyAction::default(),
        };
    }

    if capturing {
        if is_printable(c) {
            return KeyAction::command(Command::Text(c.to_string()));
        }
        return KeyAction::default();
    }

    match c {
        'r' => KeyAction::command(Command::Mode(Mode::Rectangle)),
        'e' => KeyAction::command(Command::Mode(Mode::Ellipse)),
        'a' => KeyAction::command(Command::Mode(Mode::Arrow)),
        'p' => KeyAction::command(Command::Mode(Mode::Pen)),
        'f' => KeyAction::command(Command::Fill(style.fill_color.is_none())),
        '+' => KeyAction::command(Command::Width((style.line_width + 1).min(MAX_LINE_WIDTH))),
        '-' => KeyAction::command(Command::Width(
            style.line_width.saturating_sub(1).max(MIN_LINE_WIDTH),
        )),
        _ => KeyAction::default(),
    }
}

fn is_printable(c: char) -> bool {
    !c.is_control()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::model::Color;

    fn key(c: char) -> KeyEvent {
        KeyEvent::plain(KeyCode::Char(c))
    }

    #[test]
    fn plain_letters_switch_modes() {
        let style = Style::default();
        assert_eq!(
            map_key_event(key('r'), false, &style).commands,
            vec![Command::Mode(Mode::Rectangle)]
        );
        assert_eq!(
            map_key_event(key('a'), false, &style).commands,
            vec![Command::Mode(Mode::Arrow)]
        );
        assert!(map_key_event(key('x'), false, &style).commands.is_empty());
    }

    #[test]
    fn width_and_alpha_shortcuts_are_bounded() {
        let style = Style {
            line_width: 10,
            opacity: 98,
            ..Style::default()
        };
        assert_eq!(
            map_key_event(key('+'), false, &style).commands,
            vec![Command::Width(10)]
        );
        assert_eq!(
            map_key_event(KeyEvent::ctrl('+'), false, &style).commands,
            vec![Command::Alpha(100)]
        );

        let style = Style {
            line_width: 1,
            opacity: 3,
            ..Style::default()
        };
        assert_eq!(
            map_key_event(key('-'), false, &style).commands,
            vec![Command::Width(1)]
        );
        assert_eq!(
            map_key_event(KeyEvent::ctrl('-'), false, &style).commands,
            vec![Command::Alpha(1)]
        );
        assert_eq!(
            map_key_event(KeyEvent::ctrl('r'), false, &style).commands,
            vec![Command::Alpha(DEFAULT_ALPHA)]
        );
    }

    #[test]
    fn fill_shortcut_toggles() {
        let mut style = Style::default();
        assert_eq!(
            map_key_event(key('f'), false, &style).commands,
            vec![Command::Fill(true)]
        );
        style.fill_color = Some(Color::BLACK);
        assert_eq!(
            map_key_event(key('f'), false, &style).commands,
            vec![Command::Fill(false)]
        );
    }

    #[test]
    fn capture_types_letters_instead_of_switching_modes() {
        let style = Style::default();
        let action = map_key_event(key('r'), true, &style);
        assert_eq!(action.commands, vec![Command::Text("r".into())]);
        assert_eq!(action.capture, None);

        let action = map_key_event(KeyEvent::ctrl('z'), true, &style);
        assert_eq!(action.commands, vec![Command::Undo]);
    }

    #[test]
    fn ctrl_l_starts_capture_and_escape_ends_it() {
        let style = Style::default();
        let start = map_key_event(KeyEvent::ctrl('l'), false, &style);
        assert_eq!(start.capture, Some(true));
        assert_eq!(start.commands, vec![Command::Mode(Mode::Text)]);

        let stop = map_key_event(KeyEvent::plain(KeyCode::Escape), true, &style);
        assert_eq!(stop.capture, Some(false));
        assert_eq!(stop.commands, vec![Command::Mode(Mode::Pen)]);
    }
}
