//! Parser for line oriented bus traces.
//!
//! ```text
//! # comment
//! 1000 start
//! 1100 address 0x20 write
//! 1200 data 0x55
//! 1300 stop
//! 1400 error missing ack
//! ```
//!
//! Times are unsigned integers, bytes are decimal or `0x` prefixed hex, and
//! the direction is one of `r`, `read`, `w` or `write`.

use nom::branch::alt;
use nom::bytes::complete::{tag_no_case, take_while_m_n};
use nom::character::complete::{space0, space1, u64 as time_u64, u8 as dec_u8};
use nom::combinator::{all_consuming, map, map_res, rest, value};
use nom::sequence::{preceded, separated_pair, terminated};
use nom::{IResult, Offset};

use crate::types::{BusEvent, Error, MalformedTraceSnafu, Timestamp};

type Buf<'a> = &'a str;

/// Parse one trace line. Blank lines and `#` comments yield `Ok(None)`.
///
/// # Errors
/// Returns [`Error::MalformedTrace`] with the column where parsing stopped.
pub fn parse_trace_line(line: &str) -> Result<Option<BusEvent<'_>>, Error> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    match all_consuming(event)(trimmed) {
        Ok((_, ev)) => Ok(Some(ev)),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => MalformedTraceSnafu {
            column: line.offset(e.input),
        }
        .fail(),
        Err(nom::Err::Incomplete(_)) => MalformedTraceSnafu { column: line.len() }.fail(),
    }
}

/// Parse a whole trace, skipping blank and comment lines.
pub fn parse_trace(text: &str) -> impl Iterator<Item = Result<BusEvent<'_>, Error>> + '_ {
    text.lines().filter_map(|line| parse_trace_line(line).transpose())
}

/// An event without its timestamp.
#[derive(Debug, Copy, Clone)]
enum Kind<'a> {
    Start,
    Stop,
    Address(u8, bool),
    Data(u8),
    Error(&'a str),
}

impl<'a> Kind<'a> {
    const fn at(self, time: Timestamp) -> BusEvent<'a> {
        match self {
            Kind::Start => BusEvent::Start { time },
            Kind::Stop => BusEvent::Stop { time },
            Kind::Address(address, read) => BusEvent::Address {
                time,
                address,
                read,
            },
            Kind::Data(byte) => BusEvent::Data { time, byte },
            Kind::Error(message) => BusEvent::Error { time, message },
        }
    }
}

fn event(buf: Buf<'_>) -> IResult<Buf<'_>, BusEvent<'_>> {
    let (buf, time) = terminated(time_u64, space1)(buf)?;
    let (buf, kind) = alt((
        value(Kind::Start, tag_no_case("start")),
        value(Kind::Stop, tag_no_case("stop")),
        map(
            preceded(
                terminated(tag_no_case("address"), space1),
                separated_pair(byte, space1, read_flag),
            ),
            |(address, read)| Kind::Address(address, read),
        ),
        map(preceded(terminated(tag_no_case("data"), space1), byte), Kind::Data),
        map(error_message, Kind::Error),
    ))(buf)?;
    Ok((buf, kind.at(time)))
}

fn error_message(buf: Buf<'_>) -> IResult<Buf<'_>, Buf<'_>> {
    preceded(terminated(tag_no_case("error"), space0), map(rest, str::trim_end))(buf)
}

fn byte(buf: Buf<'_>) -> IResult<Buf<'_>, u8> {
    alt((
        preceded(
            tag_no_case("0x"),
            map_res(
                take_while_m_n(1, 2, |c: char| c.is_ascii_hexdigit()),
                |hex: Buf<'_>| u8::from_str_radix(hex, 16),
            ),
        ),
        dec_u8,
    ))(buf)
}

fn read_flag(buf: Buf<'_>) -> IResult<Buf<'_>, bool> {
    alt((
        value(true, tag_no_case("read")),
        value(false, tag_no_case("write")),
        value(true, tag_no_case("r")),
        value(false, tag_no_case("w")),
    ))(buf)
}
