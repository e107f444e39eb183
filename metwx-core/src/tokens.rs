//! Forward-only token cursor shared by the positional parsers.

use crate::fields::decode_split_visibility;
use crate::model::{FieldValue, Visibility};

/// Decode a token already known to have the field's shape.
pub(crate) fn settle<T>(
    token: &str,
    label: &str,
    decode: impl Fn(&str) -> Option<T>,
    errors: &mut Vec<String>,
) -> FieldValue<T> {
    match decode(token) {
        Some(value) => FieldValue::Present(value),
        None => {
            errors.push(format!("Malformed {label}: {token}"));
            FieldValue::malformed(token, format!("invalid {label} group"))
        }
    }
}

/// Like [`settle`], but a value already decoded keeps its place and the
/// repeated group is only reported.
pub(crate) fn settle_into<T>(
    slot: &mut FieldValue<T>,
    token: &str,
    label: &str,
    decode: impl Fn(&str) -> Option<T>,
    errors: &mut Vec<String>,
) {
    if slot.present().is_some() {
        errors.push(format!("Duplicate {label}: {token}"));
        return;
    }
    *slot = settle(token, label, decode, errors);
}

/// Forward-only position over the report tokens.
pub(crate) struct Cursor<'a> {
    tokens: &'a [&'a str],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(tokens: &'a [&'a str]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub(crate) fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    pub(crate) fn peek_at(&self, offset: usize) -> Option<&'a str> {
        self.tokens.get(self.pos + offset).copied()
    }

    pub(crate) fn advance(&mut self, by: usize) {
        self.pos = (self.pos + by).min(self.tokens.len());
    }

    pub(crate) fn next(&mut self) -> Option<&'a str> {
        let token = self.peek()?;
        self.advance(1);
        Some(token)
    }

    pub(crate) fn take_if(&mut self, accept: impl Fn(&str) -> bool) -> Option<&'a str> {
        let token = self.peek().filter(|t| accept(t))?;
        self.advance(1);
        Some(token)
    }

    pub(crate) fn rest(&self) -> &'a [&'a str] {
        &self.tokens[self.pos..]
    }

    /// Optional positional field: present, malformed (shape matched), or absent.
    pub(crate) fn field<T>(
        &mut self,
        label: &str,
        decode: impl Fn(&str) -> Option<T>,
        shape: impl Fn(&str) -> bool,
        errors: &mut Vec<String>,
    ) -> FieldValue<T> {
        let Some(token) = self.peek() else {
            return FieldValue::Absent;
        };

        if let Some(value) = decode(token) {
            self.advance(1);
            FieldValue::Present(value)
        } else if shape(token) {
            self.advance(1);
            errors.push(format!("Malformed {label}: {token}"));
            FieldValue::malformed(token, format!("invalid {label} group"))
        } else {
            FieldValue::Absent
        }
    }

    /// Two-token mixed-number visibility such as `1 1/2SM`.
    pub(crate) fn split_visibility(&mut self) -> Option<Visibility> {
        let vis = decode_split_visibility(self.peek()?, self.peek_at(1)?)?;
        self.advance(2);
        Some(vis)
    }
}
