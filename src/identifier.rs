// sas - an interpreter for a subset of the SAS data-analysis language.
// Copyright (C) 2026 sas-rs contributors.
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <http://www.gnu.org/licenses/>.

//! Reserved words and the case-insensitive map-key helper.
//!
//! Matching is case-insensitive throughout the interpreter (spec invariant:
//! "Dataset names and variable names are matched case-insensitively but
//! preserve their first-declared case for display"). That invariant is
//! carried by callers keying their maps on [key] (a [UniCase] wrapper) while
//! holding the original spelling separately as a plain `String` (see
//! `catalog::Library::datasets`, `catalog::Row`, and `pdv::Pdv::index`) —
//! there is no standalone name type here.

use unicase::UniCase;

/// Returns a normalized key suitable for use as a case-insensitive map key,
/// pairing with a plain `String` held alongside it for display.
pub fn key(s: &str) -> UniCase<String> {
    UniCase::new(s.to_string())
}

/// A reserved word recognized by the lexer, matched case-insensitively.
///
/// This is the closed set of keywords that the lexer resolves to a specific
/// token kind rather than leaving as a plain identifier.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Keyword {
    Data,
    Set,
    Merge,
    By,
    If,
    Then,
    Else,
    Do,
    End,
    To,
    While,
    Until,
    Output,
    Run,
    Proc,
    Options,
    Libname,
    Title,
    Drop,
    Keep,
    Retain,
    Array,
    Input,
    Datalines,
    Where,
    And,
    Or,
    Not,
}

impl Keyword {
    /// All reserved words with their canonical spelling. Order doesn't
    /// matter; lookup is by case-insensitive string match.
    const ALL: &'static [(&'static str, Keyword)] = &[
        ("data", Keyword::Data),
        ("set", Keyword::Set),
        ("merge", Keyword::Merge),
        ("by", Keyword::By),
        ("if", Keyword::If),
        ("then", Keyword::Then),
        ("else", Keyword::Else),
        ("do", Keyword::Do),
        ("end", Keyword::End),
        ("to", Keyword::To),
        ("while", Keyword::While),
        ("until", Keyword::Until),
        ("output", Keyword::Output),
        ("run", Keyword::Run),
        ("proc", Keyword::Proc),
        ("options", Keyword::Options),
        ("libname", Keyword::Libname),
        ("title", Keyword::Title),
        ("drop", Keyword::Drop),
        ("keep", Keyword::Keep),
        ("retain", Keyword::Retain),
        ("array", Keyword::Array),
        ("input", Keyword::Input),
        ("datalines", Keyword::Datalines),
        ("cards", Keyword::Datalines),
        ("where", Keyword::Where),
        ("and", Keyword::And),
        ("or", Keyword::Or),
        ("not", Keyword::Not),
    ];

    /// Looks up `word` case-insensitively against the reserved-word table.
    pub fn lookup(word: &str) -> Option<Keyword> {
        Self::ALL
            .iter()
            .find(|(spelling, _)| spelling.eq_ignore_ascii_case(word))
            .map(|(_, kw)| *kw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_case_insensitive() {
        assert_eq!(key("Foo"), key("FOO"));
        assert_eq!(key("Foo"), key("foo"));
    }

    #[test]
    fn keyword_lookup_is_case_insensitive() {
        assert_eq!(Keyword::lookup("DATA"), Some(Keyword::Data));
        assert_eq!(Keyword::lookup("Data"), Some(Keyword::Data));
        assert_eq!(Keyword::lookup("datum"), None);
    }
}
