/**
 * Date layouts written against the Go reference time
 *
 * Configuration files describe date fields with the reference time
 * `Mon Jan 2 15:04:05 MST 2006`, e.g. `2006:01:02 15:04:05-07:00`.
 * A layout containing `%` is read as a chrono strftime pattern instead.
 */

use chrono::format::{self, Fixed, Item, Numeric, Pad, Parsed, StrftimeItems};
use chrono::{NaiveDateTime, NaiveTime, ParseResult, Timelike};
use std::iter;

use crate::error::{LayoutError, ValueMismatch};

enum Element {
    Item(Item<'static>),
    Unsupported,
}

/// Reference-time elements, longest first where prefixes overlap.
const ELEMENTS: &[(&str, Option<Item<'static>>)] = &[
    ("January", Some(Item::Fixed(Fixed::LongMonthName))),
    ("Jan", Some(Item::Fixed(Fixed::ShortMonthName))),
    ("Monday", Some(Item::Fixed(Fixed::LongWeekdayName))),
    ("Mon", Some(Item::Fixed(Fixed::ShortWeekdayName))),
    ("MST", Some(Item::Fixed(Fixed::TimezoneName))),
    ("2006", Some(Item::Numeric(Numeric::Year, Pad::Zero))),
    ("002", Some(Item::Numeric(Numeric::Ordinal, Pad::Zero))),
    ("01", Some(Item::Numeric(Numeric::Month, Pad::Zero))),
    ("02", Some(Item::Numeric(Numeric::Day, Pad::Zero))),
    ("03", Some(Item::Numeric(Numeric::Hour12, Pad::Zero))),
    ("04", Some(Item::Numeric(Numeric::Minute, Pad::Zero))),
    ("05", Some(Item::Numeric(Numeric::Second, Pad::Zero))),
    ("06", Some(Item::Numeric(Numeric::YearMod100, Pad::Zero))),
    ("15", Some(Item::Numeric(Numeric::Hour, Pad::Zero))),
    ("1", Some(Item::Numeric(Numeric::Month, Pad::None))),
    ("2", Some(Item::Numeric(Numeric::Day, Pad::None))),
    ("3", Some(Item::Numeric(Numeric::Hour12, Pad::None))),
    ("4", Some(Item::Numeric(Numeric::Minute, Pad::None))),
    ("5", Some(Item::Numeric(Numeric::Second, Pad::None))),
    ("__2", None),
    ("_2", Some(Item::Numeric(Numeric::Day, Pad::Space))),
    ("PM", Some(Item::Fixed(Fixed::UpperAmPm))),
    ("pm", Some(Item::Fixed(Fixed::LowerAmPm))),
    ("Z07:00:00", None),
    ("Z070000", None),
    ("Z07:00", Some(Item::Fixed(Fixed::TimezoneOffsetColonZ))),
    ("Z0700", Some(Item::Fixed(Fixed::TimezoneOffsetZ))),
    ("Z07", None),
    ("-07:00:00", None),
    ("-070000", None),
    ("-07:00", Some(Item::Fixed(Fixed::TimezoneOffsetColon))),
    ("-0700", Some(Item::Fixed(Fixed::TimezoneOffset))),
    ("-07", None),
];

/// A compiled date layout.
#[derive(Debug, Clone)]
pub struct Layout {
    source: String,
    items: Vec<Item<'static>>,
    has_time: bool,
    has_am_pm: bool,
}

impl Layout {
    pub fn parse(layout: &str) -> Result<Self, LayoutError> {
        if layout.is_empty() {
            return Err(LayoutError::Empty);
        }

        let items = if layout.contains('%') {
            strftime_items(layout)?
        } else {
            reference_items(layout)?
        };

        let has_time = items
            .iter()
            .any(|item| matches!(item, Item::Numeric(Numeric::Hour | Numeric::Hour12, _)));
        let has_am_pm = items
            .iter()
            .any(|item| matches!(item, Item::Fixed(Fixed::UpperAmPm | Fixed::LowerAmPm)));

        Ok(Self {
            source: layout.to_string(),
            items,
            has_time,
            has_am_pm,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parse `value` against the layout and return the wall-clock date and time
    /// exactly as written. A UTC offset or zone name is accepted and dropped,
    /// sub-seconds are dropped, a layout without a time of day yields midnight.
    ///
    /// Numbers must have exactly the width of their layout element (`2006` is
    /// four digits, `01` two) and carry no sign or surrounding whitespace.
    /// A 12-hour layout without `PM` reads the hour as written.
    pub fn parse_wall_clock(&self, value: &str) -> Result<NaiveDateTime, ValueMismatch> {
        let mut parsed = Parsed::new();
        let mut rest = value;

        for item in &self.items {
            rest = match item {
                Item::Numeric(numeric, pad) => match NumberSpec::new(numeric, *pad, self.has_am_pm) {
                    Some(spec) => spec.consume(&mut parsed, rest)?,
                    None => parse_item(&mut parsed, rest, item)?,
                },
                Item::Fixed(_) if rest.starts_with(char::is_whitespace) => {
                    return Err(ValueMismatch::Whitespace {
                        found: rest.to_string(),
                    })
                }
                _ => parse_item(&mut parsed, rest, item)?,
            };
        }

        if !rest.is_empty() {
            return Err(ValueMismatch::Trailing {
                found: rest.to_string(),
            });
        }

        let date = parsed.to_naive_date()?;
        let time = if self.has_time {
            parsed.to_naive_time()?
        } else {
            NaiveTime::default()
        };

        Ok(date.and_time(time.with_nanosecond(0).unwrap_or(time)))
    }
}

fn parse_item<'b>(parsed: &mut Parsed, rest: &'b str, item: &Item<'static>) -> Result<&'b str, ValueMismatch> {
    Ok(format::parse_and_remainder(parsed, rest, iter::once(item))?)
}

type Setter = fn(&mut Parsed, i64) -> ParseResult<()>;

/// A date or time number read with a fixed digit count instead of chrono's
/// lenient scanner.
struct NumberSpec {
    min: usize,
    max: usize,
    leading_space: bool,
    set: Setter,
}

impl NumberSpec {
    fn new(numeric: &Numeric, pad: Pad, has_am_pm: bool) -> Option<Self> {
        let (width, set): (usize, Setter) = match numeric {
            Numeric::Year => (4, Parsed::set_year),
            Numeric::YearMod100 => (2, set_two_digit_year),
            Numeric::Month => (2, Parsed::set_month),
            Numeric::Day => (2, Parsed::set_day),
            Numeric::Ordinal => (3, Parsed::set_ordinal),
            Numeric::Hour => (2, Parsed::set_hour),
            Numeric::Hour12 if has_am_pm => (2, set_hour12),
            Numeric::Hour12 => (2, set_hour12_without_am_pm),
            Numeric::Minute => (2, Parsed::set_minute),
            Numeric::Second => (2, Parsed::set_second),
            _ => return None,
        };

        let (min, leading_space) = match pad {
            Pad::Zero => (width, false),
            Pad::None => (1, false),
            Pad::Space => (1, true),
        };

        Some(Self {
            min,
            max: width,
            leading_space,
            set,
        })
    }

    fn consume<'b>(&self, parsed: &mut Parsed, rest: &'b str) -> Result<&'b str, ValueMismatch> {
        let rest = match rest.strip_prefix(' ') {
            Some(stripped) if self.leading_space => stripped,
            _ => rest,
        };

        let len = rest
            .bytes()
            .take(self.max)
            .take_while(u8::is_ascii_digit)
            .count();
        if len < self.min {
            return Err(ValueMismatch::Digits {
                expected: if self.min == self.max {
                    self.min.to_string()
                } else {
                    format!("{} to {}", self.min, self.max)
                },
                found: rest.to_string(),
            });
        }

        let (digits, remainder) = rest.split_at(len);
        let number = digits
            .bytes()
            .fold(0i64, |n, digit| n * 10 + i64::from(digit - b'0'));
        (self.set)(parsed, number)?;
        Ok(remainder)
    }
}

// 69-99 are the 1900s, 00-68 the 2000s.
fn set_two_digit_year(parsed: &mut Parsed, year: i64) -> ParseResult<()> {
    parsed.set_year(if year >= 69 { 1900 + year } else { 2000 + year })
}

fn set_hour12(parsed: &mut Parsed, hour: i64) -> ParseResult<()> {
    parsed.set_hour12(if hour == 0 { 12 } else { hour })
}

fn set_hour12_without_am_pm(parsed: &mut Parsed, hour: i64) -> ParseResult<()> {
    if hour > 12 {
        // out of range for a 12-hour clock
        return parsed.set_hour12(hour);
    }
    parsed.set_hour(hour)
}

fn reference_items(layout: &str) -> Result<Vec<Item<'static>>, LayoutError> {
    let mut items = Vec::new();
    let mut literal = String::new();
    let mut rest = layout;

    while let Some(ch) = rest.chars().next() {
        let Some((len, element)) = next_element(rest) else {
            literal.push(ch);
            rest = &rest[ch.len_utf8()..];
            continue;
        };

        if !literal.is_empty() {
            items.push(Item::OwnedLiteral(std::mem::take(&mut literal).into_boxed_str()));
        }

        match element {
            Element::Item(item) => items.push(item),
            Element::Unsupported => {
                return Err(LayoutError::Unsupported {
                    layout: layout.to_string(),
                    element: rest[..len].to_string(),
                })
            }
        }
        rest = &rest[len..];
    }

    if !literal.is_empty() {
        items.push(Item::OwnedLiteral(literal.into_boxed_str()));
    }

    Ok(items)
}

/// The element at the start of `rest`, with its length in bytes.
fn next_element(rest: &str) -> Option<(usize, Element)> {
    if let Some(fraction) = fraction_element(rest) {
        return Some(fraction);
    }

    ELEMENTS
        .iter()
        .find(|(prefix, _)| rest.starts_with(prefix))
        .map(|(prefix, item)| {
            let element = match item {
                Some(item) => Element::Item(item.clone()),
                None => Element::Unsupported,
            };
            (prefix.len(), element)
        })
}

/// `.000` style fixed fractions or `.999` style optional fractions.
fn fraction_element(rest: &str) -> Option<(usize, Element)> {
    let mut chars = rest.chars();
    if chars.next() != Some('.') {
        return None;
    }
    let digit = chars.next().filter(|c| *c == '0' || *c == '9')?;

    let width = 1 + rest[2..].chars().take_while(|c| *c == digit).count();
    let len = 1 + width;
    if rest[len..].starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let fixed = match (digit, width) {
        ('0', 3) => Fixed::Nanosecond3,
        ('0', 6) => Fixed::Nanosecond6,
        ('0', 9) => Fixed::Nanosecond9,
        _ => Fixed::Nanosecond,
    };
    Some((len, Element::Item(Item::Fixed(fixed))))
}

fn strftime_items(layout: &str) -> Result<Vec<Item<'static>>, LayoutError> {
    StrftimeItems::new(layout)
        .map(|item| match item {
            Item::Literal(text) => Ok(Item::OwnedLiteral(text.into())),
            Item::OwnedLiteral(text) => Ok(Item::OwnedLiteral(text)),
            // whitespace must match exactly, as in reference layouts
            Item::Space(text) => Ok(Item::OwnedLiteral(text.into())),
            Item::OwnedSpace(text) => Ok(Item::OwnedLiteral(text)),
            Item::Numeric(numeric, pad) => Ok(Item::Numeric(numeric, pad)),
            Item::Fixed(fixed) => Ok(Item::Fixed(fixed)),
            Item::Error => Err(LayoutError::Strftime {
                layout: layout.to_string(),
            }),
        })
        .collect()
}
