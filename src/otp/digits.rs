//! Segmented digit entry.
//!
//! Keystrokes are pure functions from the current buffer to the next one, focus
//! included, so any UI only has to forward events and render the result.

use crate::otp::{error::ValidationError, CODE_LENGTH};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DigitBuffer {
    slots: [Option<char>; CODE_LENGTH],
    focus: usize,
}

impl DigitBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn slots(&self) -> &[Option<char>; CODE_LENGTH] {
        &self.slots
    }

    #[must_use]
    pub fn focus(&self) -> usize {
        self.focus
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<char> {
        self.slots.get(index).copied().flatten()
    }

    /// Indices of the empty slots, in order.
    #[must_use]
    pub fn missing(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Slots concatenated in index order, or the empty indices.
    ///
    /// # Errors
    /// Returns `ValidationError::Incomplete` when any slot is empty.
    pub fn candidate(&self) -> Result<String, ValidationError> {
        if self.is_complete() {
            Ok(self.slots.iter().flatten().collect())
        } else {
            Err(ValidationError::Incomplete {
                missing: self.missing(),
            })
        }
    }

    fn next_empty_after(&self, index: usize) -> Option<usize> {
        (index + 1..CODE_LENGTH).find(|&i| self.slots[i].is_none())
    }
}

impl fmt::Display for DigitBuffer {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, slot) in self.slots.iter().enumerate() {
            if index > 0 {
                formatter.write_str(" ")?;
            }
            write!(formatter, "{}", slot.unwrap_or('_'))?;
        }
        Ok(())
    }
}

fn check_index(index: usize) -> Result<(), ValidationError> {
    if index < CODE_LENGTH {
        Ok(())
    } else {
        Err(ValidationError::SlotOutOfRange { index })
    }
}

/// Re-validate one slot value: empty or a single ASCII digit.
///
/// # Errors
/// Returns `ValidationError::NotADigit` for anything else.
pub fn validate_slot(index: usize, value: &str) -> Result<Option<char>, ValidationError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Ok(None),
        (Some(c), None) if c.is_ascii_digit() => Ok(Some(c)),
        _ => Err(ValidationError::NotADigit { index }),
    }
}

/// Apply a change event to slot `index`.
///
/// A digit fills the slot and moves focus to the next empty slot after it. An
/// empty value clears the slot and leaves focus on it.
///
/// # Errors
/// Rejects out-of-range indices and non-digit values; the buffer is unchanged.
pub fn edit(
    buffer: &DigitBuffer,
    index: usize,
    value: &str,
) -> Result<DigitBuffer, ValidationError> {
    check_index(index)?;
    let slot = validate_slot(index, value)?;

    let mut next = *buffer;
    next.slots[index] = slot;
    next.focus = match slot {
        Some(_) => next
            .next_empty_after(index)
            .unwrap_or_else(|| (index + 1).min(CODE_LENGTH - 1)),
        None => index,
    };

    Ok(next)
}

/// Apply a backspace keypress on slot `index`.
///
/// # Errors
/// Rejects out-of-range indices.
pub fn backspace(buffer: &DigitBuffer, index: usize) -> Result<DigitBuffer, ValidationError> {
    check_index(index)?;

    let mut next = *buffer;
    if next.slots[index].is_some() {
        next.slots[index] = None;
        next.focus = index;
    } else {
        next.focus = index.saturating_sub(1);
    }

    Ok(next)
}

/// Type each character of `text` into the focused slot, as a paste would.
///
/// A full-length paste replaces the whole buffer. Shorter input only goes into
/// empty slots; typing into a filled slot is refused like a full `maxlength=1`
/// field.
///
/// # Errors
/// Rejects the whole input if any character is not a digit or runs into a
/// filled slot; the buffer is unchanged.
pub fn type_at_focus(buffer: &DigitBuffer, text: &str) -> Result<DigitBuffer, ValidationError> {
    if let Some(offset) = text.chars().position(|c| !c.is_ascii_digit()) {
        return Err(ValidationError::NotADigit {
            index: (buffer.focus + offset).min(CODE_LENGTH - 1),
        });
    }

    let mut next = if text.chars().count() == CODE_LENGTH {
        DigitBuffer::new()
    } else {
        *buffer
    };

    let mut utf8 = [0u8; 4];
    for c in text.chars() {
        let index = next.focus;
        if next.slots[index].is_some() {
            return Err(ValidationError::SlotFilled { index });
        }
        next = edit(&next, index, c.encode_utf8(&mut utf8))?;
    }

    Ok(next)
}
