//! Keyword highlighting for announcement and narration text.
//!
//! Splits a string into fragments that borrow from the input, so joining the
//! fragments always gives back the original text.

/// An RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub fn hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }

    /// 24-bit ANSI foreground escape.
    pub fn ansi_fg(self) -> String {
        format!("\x1b[38;2;{};{};{}m", self.0, self.1, self.2)
    }
}

pub const ANSI_RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keyword {
    pub word: &'static str,
    pub color: Color,
}

const WOLF_RED: Color = Color(0xD6, 0x28, 0x28);
const VILLAGE_GREEN: Color = Color(0x4C, 0xAF, 0x50);
const SEER_PURPLE: Color = Color(0x8E, 0x44, 0xAD);
const WITCH_TEAL: Color = Color(0x16, 0xA0, 0x85);
const HUNTER_BROWN: Color = Color(0xA0, 0x6A, 0x2C);
const NIGHT_BLUE: Color = Color(0x34, 0x5E, 0xC8);
const DAY_GOLD: Color = Color(0xF1, 0xC4, 0x0F);
const DEATH_GREY: Color = Color(0x95, 0xA5, 0xA6);

/// Words highlighted in narration.
pub const DEFAULT_KEYWORDS: &[Keyword] = &[
    Keyword { word: "lobo", color: WOLF_RED },
    Keyword { word: "lobos", color: WOLF_RED },
    Keyword { word: "aldeano", color: VILLAGE_GREEN },
    Keyword { word: "aldeanos", color: VILLAGE_GREEN },
    Keyword { word: "pueblo", color: VILLAGE_GREEN },
    Keyword { word: "vidente", color: SEER_PURPLE },
    Keyword { word: "bruja", color: WITCH_TEAL },
    Keyword { word: "cazador", color: HUNTER_BROWN },
    Keyword { word: "alguacil", color: HUNTER_BROWN },
    Keyword { word: "noche", color: NIGHT_BLUE },
    Keyword { word: "día", color: DAY_GOLD },
    Keyword { word: "amanece", color: DAY_GOLD },
    Keyword { word: "muerto", color: DEATH_GREY },
    Keyword { word: "muerta", color: DEATH_GREY },
    Keyword { word: "eliminado", color: DEATH_GREY },
];

/// A run of text, coloured if it matched a keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragment<'a> {
    pub text: &'a str,
    pub color: Option<Color>,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

/// Length in bytes of `word` matched case-insensitively at the start of
/// `text`, if it matches.
fn match_len(text: &str, word: &str) -> Option<usize> {
    let mut chars = text.char_indices();
    for w in word.chars() {
        let (_, c) = chars.next()?;
        if !c.to_lowercase().eq(w.to_lowercase()) {
            return None;
        }
    }
    Some(chars.next().map_or(text.len(), |(i, _)| i))
}

/// Split `text` into alternating plain and highlighted fragments.
///
/// A keyword only matches as a whole word: the characters on either side
/// must not be letters or digits. When several keywords match at the same
/// place, the longest one wins.
pub fn colorize<'a>(text: &'a str, keywords: &[Keyword]) -> Vec<Fragment<'a>> {
    let mut fragments = Vec::new();
    let mut plain_start = 0;
    let mut prev: Option<char> = None;
    let mut iter = text.char_indices().peekable();

    while let Some(&(i, c)) = iter.peek() {
        let at_boundary = prev.is_none_or(|p| !is_word_char(p));
        let hit = if at_boundary {
            keywords
                .iter()
                .filter_map(|k| {
                    let len = match_len(&text[i..], k.word)?;
                    let after = text[i + len..].chars().next();
                    if after.is_some_and(is_word_char) {
                        None
                    } else {
                        Some((len, k.color))
                    }
                })
                .max_by_key(|&(len, _)| len)
        } else {
            None
        };

        match hit {
            Some((len, color)) => {
                if plain_start < i {
                    fragments.push(Fragment {
                        text: &text[plain_start..i],
                        color: None,
                    });
                }
                let end = i + len;
                fragments.push(Fragment {
                    text: &text[i..end],
                    color: Some(color),
                });
                plain_start = end;
                prev = text[..end].chars().next_back();
                while iter.peek().is_some_and(|&(j, _)| j < end) {
                    iter.next();
                }
            }
            None => {
                prev = Some(c);
                iter.next();
            }
        }
    }
    if plain_start < text.len() {
        fragments.push(Fragment {
            text: &text[plain_start..],
            color: None,
        });
    }
    fragments
}

/// Render fragments for a 24-bit colour terminal.
pub fn to_ansi(fragments: &[Fragment<'_>]) -> String {
    let mut out = String::new();
    for fragment in fragments {
        match fragment.color {
            Some(color) => {
                out.push_str(&color.ansi_fg());
                out.push_str(fragment.text);
                out.push_str(ANSI_RESET);
            }
            None => out.push_str(fragment.text),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(fragments: &[Fragment<'_>]) -> String {
        fragments.iter().map(|f| f.text).collect()
    }

    #[test]
    fn concatenation_reproduces_input() {
        let inputs = [
            "",
            "sin palabras clave",
            "Cae la noche. Los LOBOS salen de caza.",
            "lobo",
            "  lobo  ",
            "¡El cazador ha muerto!",
            "Lobolandia no es un lobo",
            "DÍA 3: la Bruja y el Vidente",
            "emoji 🐺 lobo🐺lobo",
        ];
        for input in inputs {
            assert_eq!(joined(&colorize(input, DEFAULT_KEYWORDS)), input);
        }
    }

    #[test]
    fn empty_input_has_no_fragments() {
        assert!(colorize("", DEFAULT_KEYWORDS).is_empty());
    }

    #[test]
    fn matches_are_case_insensitive_whole_words() {
        let fragments = colorize("Los LOBOS y el lobato", DEFAULT_KEYWORDS);
        let colored: Vec<&str> = fragments
            .iter()
            .filter(|f| f.color.is_some())
            .map(|f| f.text)
            .collect();
        assert_eq!(colored, ["LOBOS"]);
    }

    #[test]
    fn fragments_alternate() {
        let fragments = colorize("la bruja salva al aldeano", DEFAULT_KEYWORDS);
        let shape: Vec<bool> = fragments.iter().map(|f| f.color.is_some()).collect();
        assert_eq!(shape, [false, true, false, true]);
        assert_eq!(fragments[1].color, Some(WITCH_TEAL));
    }

    #[test]
    fn accented_keywords_match() {
        let fragments = colorize("Llega el DÍA", DEFAULT_KEYWORDS);
        assert_eq!(fragments.last().map(|f| (f.text, f.color)), Some(("DÍA", Some(DAY_GOLD))));
    }

    #[test]
    fn no_match_is_single_plain_fragment() {
        let fragments = colorize("nada que ver", DEFAULT_KEYWORDS);
        assert_eq!(fragments, [Fragment { text: "nada que ver", color: None }]);
    }

    #[test]
    fn ansi_output_wraps_keywords() {
        let out = to_ansi(&colorize("un lobo", DEFAULT_KEYWORDS));
        assert_eq!(out, format!("un {}lobo{ANSI_RESET}", WOLF_RED.ansi_fg()));
    }

    #[test]
    fn hex_formatting() {
        assert_eq!(WOLF_RED.hex(), "#D62828");
    }
}
