//! Palette, text style, and the SGR code table.

use serde::{Serialize, Serializer};

/// One of the 16 ANSI palette colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// SGR 30 / 40
    Black,
    /// SGR 31 / 41
    Red,
    /// SGR 32 / 42
    Green,
    /// SGR 33 / 43
    Yellow,
    /// SGR 34 / 44
    Blue,
    /// SGR 35 / 45
    Magenta,
    /// SGR 36 / 46
    Cyan,
    /// SGR 37 / 47
    White,
    /// SGR 90 / 100
    BrightBlack,
    /// SGR 91 / 101
    BrightRed,
    /// SGR 92 / 102
    BrightGreen,
    /// SGR 93 / 103
    BrightYellow,
    /// SGR 94 / 104
    BrightBlue,
    /// SGR 95 / 105
    BrightMagenta,
    /// SGR 96 / 106
    BrightCyan,
    /// SGR 97 / 107
    BrightWhite,
}

/// Normal colors in SGR order (`30`..`37`).
const NORMAL: [Color; 8] = [
    Color::Black,
    Color::Red,
    Color::Green,
    Color::Yellow,
    Color::Blue,
    Color::Magenta,
    Color::Cyan,
    Color::White,
];

/// Bright colors in SGR order (`90`..`97`).
const BRIGHT: [Color; 8] = [
    Color::BrightBlack,
    Color::BrightRed,
    Color::BrightGreen,
    Color::BrightYellow,
    Color::BrightBlue,
    Color::BrightMagenta,
    Color::BrightCyan,
    Color::BrightWhite,
];

impl Color {
    /// `#RRGGBB` value the terminal view renders.
    pub fn hex(self) -> &'static str {
        match self {
            Self::Black => "#000000",
            Self::Red => "#CD3131",
            Self::Green => "#0DBC79",
            Self::Yellow => "#E5E510",
            Self::Blue => "#2472C8",
            Self::Magenta => "#BC3FBC",
            Self::Cyan => "#11A8CD",
            Self::White => "#E5E5E5",
            Self::BrightBlack => "#666666",
            Self::BrightRed => "#F14C4C",
            Self::BrightGreen => "#23D18B",
            Self::BrightYellow => "#F5F543",
            Self::BrightBlue => "#3B8EEA",
            Self::BrightMagenta => "#D670D6",
            Self::BrightCyan => "#29B8DB",
            Self::BrightWhite => "#FFFFFF",
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.hex())
    }
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// Style of a run of text. `Default` is plain text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    /// Foreground color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    /// Background color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Color>,
    /// Bold weight.
    #[serde(skip_serializing_if = "is_false")]
    pub bold: bool,
    /// Italic.
    #[serde(skip_serializing_if = "is_false")]
    pub italic: bool,
    /// Underline.
    #[serde(skip_serializing_if = "is_false")]
    pub underline: bool,
    /// Faint intensity.
    #[serde(skip_serializing_if = "is_false")]
    pub dim: bool,
}

impl Style {
    /// True when no attribute is set.
    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }

    /// Apply one SGR effect.
    pub fn apply(&mut self, effect: SgrEffect) {
        match effect {
            SgrEffect::Reset => *self = Self::default(),
            SgrEffect::Bold => self.bold = true,
            SgrEffect::Dim => self.dim = true,
            SgrEffect::Italic => self.italic = true,
            SgrEffect::Underline => self.underline = true,
            SgrEffect::NormalIntensity => {
                self.bold = false;
                self.dim = false;
            }
            SgrEffect::NotItalic => self.italic = false,
            SgrEffect::NotUnderlined => self.underline = false,
            SgrEffect::Foreground(color) => self.color = Some(color),
            SgrEffect::Background(color) => self.background_color = Some(color),
            SgrEffect::DefaultForeground => self.color = None,
            SgrEffect::DefaultBackground => self.background_color = None,
        }
    }
}

/// What a single SGR parameter does to the current [`Style`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SgrEffect {
    /// `0`
    Reset,
    /// `1`
    Bold,
    /// `2`
    Dim,
    /// `3`
    Italic,
    /// `4`
    Underline,
    /// `22`: clears bold and dim
    NormalIntensity,
    /// `23`
    NotItalic,
    /// `24`
    NotUnderlined,
    /// `30`-`37`, `90`-`97`
    Foreground(Color),
    /// `40`-`47`, `100`-`107`
    Background(Color),
    /// `39`
    DefaultForeground,
    /// `49`
    DefaultBackground,
}

/// The SGR table. Codes outside it return `None` and are ignored.
pub fn sgr_effect(code: u32) -> Option<SgrEffect> {
    let effect = match code {
        0 => SgrEffect::Reset,
        1 => SgrEffect::Bold,
        2 => SgrEffect::Dim,
        3 => SgrEffect::Italic,
        4 => SgrEffect::Underline,
        22 => SgrEffect::NormalIntensity,
        23 => SgrEffect::NotItalic,
        24 => SgrEffect::NotUnderlined,
        30..=37 => SgrEffect::Foreground(NORMAL[(code - 30) as usize]),
        39 => SgrEffect::DefaultForeground,
        40..=47 => SgrEffect::Background(NORMAL[(code - 40) as usize]),
        49 => SgrEffect::DefaultBackground,
        90..=97 => SgrEffect::Foreground(BRIGHT[(code - 90) as usize]),
        100..=107 => SgrEffect::Background(BRIGHT[(code - 100) as usize]),
        _ => return None,
    };
    Some(effect)
}
