// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background colour sampling.
//
// Page backgrounds are conventionally painted first, so only the leading
// window of the content stream is tokenised and searched for a fill-colour
// operator. This is a best-effort heuristic: the graphics-state stack and the
// regions actually painted are not tracked.

use bleedmark_core::Rgb;

/// Number of leading content bytes inspected.
pub const SAMPLE_WINDOW: usize = 3000;

/// First fill colour found in a content stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillSample {
    None,
    Gray(f64),
    Rgb(Rgb),
}

impl FillSample {
    pub fn color(self) -> Option<Rgb> {
        match self {
            Self::None => None,
            Self::Gray(value) => Some(Rgb::gray(value)),
            Self::Rgb(color) => Some(color),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    Number(f64),
    Operator(&'a [u8]),
    /// Names, strings, array and dictionary delimiters.
    Other,
}

/// Minimal content-stream lexer; enough structure to tell operands from
/// operators without being fooled by strings or comments.
struct Tokens<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_literal_string(&mut self) {
        // Opening paren already consumed.
        let mut depth = 1usize;
        while let Some(byte) = self.peek() {
            self.pos += 1;
            match byte {
                b'\\' => self.pos += 1,
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    fn skip_until(&mut self, stop: impl Fn(u8) -> bool) {
        while let Some(byte) = self.peek() {
            if stop(byte) {
                return;
            }
            self.pos += 1;
        }
    }
}

fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n' | b'\x0c' | b'\0')
}

fn is_delimiter(byte: u8) -> bool {
    matches!(
        byte,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn parse_number(run: &[u8]) -> Option<f64> {
    let digits = run.iter().filter(|b| b.is_ascii_digit()).count();
    let valid = digits > 0
        && run
            .iter()
            .enumerate()
            .all(|(i, &b)| b.is_ascii_digit() || b == b'.' || (i == 0 && (b == b'+' || b == b'-')))
        && run.iter().filter(|b| **b == b'.').count() <= 1;
    if !valid {
        return None;
    }
    std::str::from_utf8(run).ok()?.parse().ok()
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        loop {
            self.skip_until(|b| !is_whitespace(b));
            let byte = self.peek()?;
            self.pos += 1;
            return Some(match byte {
                b'%' => {
                    self.skip_until(|b| b == b'\n' || b == b'\r');
                    continue;
                }
                b'(' => {
                    self.skip_literal_string();
                    Token::Other
                }
                b'<' => {
                    if self.peek() == Some(b'<') {
                        self.pos += 1;
                    } else {
                        self.skip_until(|b| b == b'>');
                        self.pos += 1;
                    }
                    Token::Other
                }
                b'>' | b')' | b'[' | b']' | b'{' | b'}' => Token::Other,
                b'/' => {
                    self.skip_until(|b| is_whitespace(b) || is_delimiter(b));
                    Token::Other
                }
                _ => {
                    let start = self.pos - 1;
                    self.skip_until(|b| is_whitespace(b) || is_delimiter(b));
                    let run = &self.bytes[start..self.pos];
                    match parse_number(run) {
                        Some(value) => Token::Number(value),
                        None => Token::Operator(run),
                    }
                }
            });
        }
    }
}

/// Find the page's fill colour in the leading [`SAMPLE_WINDOW`] bytes.
///
/// Priority is by operator kind, not position: the first `rg` with three
/// operands wins over the first `sc`/`scn` with three operands, which wins
/// over the first single-operand `g`.
pub fn sample_fill(raw: &[u8]) -> FillSample {
    let window = &raw[..raw.len().min(SAMPLE_WINDOW)];

    // Last three operands, most recent last.
    let mut operands: [Option<f64>; 3] = [None; 3];
    let mut generic: Option<Rgb> = None;
    let mut gray: Option<f64> = None;

    for token in Tokens::new(window) {
        let value = match token {
            Token::Number(value) => Some(value),
            Token::Operator(op) => {
                let triple = match operands {
                    [Some(r), Some(g), Some(b)] => Some(Rgb::new(r, g, b).clamped()),
                    _ => None,
                };
                match op {
                    b"rg" => {
                        if let Some(color) = triple {
                            return FillSample::Rgb(color);
                        }
                    }
                    b"sc" | b"scn" => {
                        if generic.is_none() {
                            generic = triple;
                        }
                    }
                    b"g" => {
                        if gray.is_none() {
                            gray = operands[2].map(|v| v.clamp(0.0, 1.0));
                        }
                    }
                    _ => {}
                }
                None
            }
            Token::Other => None,
        };
        operands.rotate_left(1);
        operands[2] = value;
    }

    match (generic, gray) {
        (Some(color), _) => FillSample::Rgb(color),
        (None, Some(value)) => FillSample::Gray(value),
        (None, None) => FillSample::None,
    }
}

/// Background colour of a page's content, white when nothing is found.
pub fn detect_background(raw: &[u8]) -> Rgb {
    sample_fill(raw).color().unwrap_or(Rgb::WHITE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_fill_is_detected() {
        let color = detect_background(b"0.5 0.5 0.5 rg\n0 0 100 100 re f");
        assert_eq!(color, Rgb::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn no_fill_operator_is_white() {
        assert_eq!(detect_background(b"0 0 m 100 100 l S"), Rgb::WHITE);
        assert_eq!(detect_background(b""), Rgb::WHITE);
        assert_eq!(sample_fill(b"BT /F1 12 Tf (Hello) Tj ET"), FillSample::None);
    }

    #[test]
    fn rgb_beats_earlier_gray() {
        let sample = sample_fill(b"0.2 g 0 0 10 10 re f 0.1 0.2 0.3 rg 0 0 5 5 re f");
        assert_eq!(sample, FillSample::Rgb(Rgb::new(0.1, 0.2, 0.3)));
    }

    #[test]
    fn generic_colour_space_fill() {
        let sample = sample_fill(b"/Cs1 cs 0.04 0.06 0.14 scn 0 0 720 405 re f");
        assert_eq!(sample, FillSample::Rgb(Rgb::new(0.04, 0.06, 0.14)));
    }

    #[test]
    fn pattern_fill_without_numbers_is_ignored() {
        let sample = sample_fill(b"/Pattern cs /P0 scn 0 0 10 10 re f 0.25 g");
        assert_eq!(sample, FillSample::Gray(0.25));
    }

    #[test]
    fn gray_is_replicated() {
        assert_eq!(detect_background(b"0.8 g 0 0 10 10 re f"), Rgb::gray(0.8));
    }

    #[test]
    fn stroke_colour_is_not_a_fill() {
        assert_eq!(sample_fill(b"1 0 0 RG 0 G 0 0 m 1 1 l S"), FillSample::None);
    }

    #[test]
    fn strings_and_comments_are_skipped() {
        let raw = b"% 0.1 0.1 0.1 rg\nBT (0.2 0.2 0.2 rg) Tj ET 0.9 0.8 0.7 rg";
        assert_eq!(sample_fill(raw), FillSample::Rgb(Rgb::new(0.9, 0.8, 0.7)));
    }

    #[test]
    fn only_leading_window_is_searched() {
        let mut raw = vec![b' '; SAMPLE_WINDOW];
        raw.extend_from_slice(b"0.1 0.2 0.3 rg");
        assert_eq!(sample_fill(&raw), FillSample::None);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        assert_eq!(
            sample_fill(b"255 0 1.5 rg"),
            FillSample::Rgb(Rgb::new(1.0, 0.0, 1.0))
        );
    }
}
