//! Input as the renderer sees it, independent of the windowing layer.

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    /// Pointer movement in pixels.
    PointerMoved { dx: f32, dy: f32 },
    PointerButton { pressed: bool },
    /// Scroll in lines, positive away from the user.
    Scroll { lines: f32 },
    Command(Command),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    NextScene,
    PreviousScene,
    ToggleLightOrbit,
    IncreaseShadowBias,
    DecreaseShadowBias,
}

impl Command {
    /// The command bound to a character key, if any.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '8' => Some(Command::NextScene),
            '7' => Some(Command::PreviousScene),
            'l' | 'L' => Some(Command::ToggleLightOrbit),
            '+' | '=' => Some(Command::IncreaseShadowBias),
            '-' | '_' => Some(Command::DecreaseShadowBias),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(Command::from_char('8'), Some(Command::NextScene));
        assert_eq!(Command::from_char('7'), Some(Command::PreviousScene));
        assert_eq!(Command::from_char('L'), Some(Command::ToggleLightOrbit));
        assert_eq!(Command::from_char('x'), None);
    }
}
