use std::str::{FromStr, Utf8Error};

use lettre::Address;
use nom::{
    bytes::complete::{tag, tag_no_case, take_until},
    character::complete::space0,
    combinator::map_res,
    sequence::{delimited, preceded},
    IResult,
};
use tracing::debug;

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Helo {
        domain: String,
    },
    Ehlo {
        domain: String,
    },
    /// AUTH <mechanism> [initial-response]
    ///
    /// See [RFC 4954](https://datatracker.ietf.org/doc/html/rfc4954#section-4).
    Auth {
        mechanism: String,
        /// Initial client response to save a round-trip.
        initial_response: Option<String>,
    },
    Mail {
        from: Address,
    },
    Rcpt {
        to: Address,
    },
    Data,
    Rset,
    Noop,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    UnrecognizedCommand,
    Syntax(&'static str),
    InvalidUtf8,
}

impl From<Utf8Error> for Error {
    fn from(_e: Utf8Error) -> Self {
        Error::InvalidUtf8
    }
}

impl TryFrom<&[u8]> for Command {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let s = std::str::from_utf8(bytes)?;
        debug!(?s, "parsing command");
        let (verb, args) = s.split_once(' ').unwrap_or((s, ""));

        let cmd = match verb.to_ascii_uppercase().as_str() {
            "HELO" => Command::Helo {
                domain: args.to_owned(),
            },
            "EHLO" => Command::Ehlo {
                domain: args.to_owned(),
            },
            "AUTH" => {
                let mut args = args.splitn(2, ' ');

                Command::Auth {
                    mechanism: args
                        .next()
                        .filter(|s| !s.is_empty())
                        .map(str::to_ascii_uppercase)
                        .ok_or(Error::Syntax("AUTH <mechanism> [initial-response]"))?,
                    initial_response: args.next().map(ToOwned::to_owned),
                }
            }
            "MAIL" => Command::Mail {
                from: mailbox("FROM:", args).ok_or(Error::Syntax("MAIL FROM:<address>"))?,
            },
            "RCPT" => Command::Rcpt {
                to: mailbox("TO:", args).ok_or(Error::Syntax("RCPT TO:<address>"))?,
            },
            "DATA" => Command::Data,
            "RSET" => Command::Rset,
            "NOOP" => Command::Noop,
            "QUIT" => Command::Quit,
            _ => return Err(Error::UnrecognizedCommand),
        };

        Ok(cmd)
    }
}

fn parse_mailbox<'a>(prefix: &'static str, i: &'a str) -> IResult<&'a str, Address> {
    preceded(
        tag_no_case(prefix),
        preceded(
            space0,
            map_res(
                delimited(tag("<"), take_until(">"), tag(">")),
                Address::from_str,
            ),
        ),
    )(i)
}

/// Extract the address from `FROM:<address> [parameters]`. The null
/// reverse path `<>` is not an address and is refused.
fn mailbox(prefix: &'static str, args: &str) -> Option<Address> {
    match parse_mailbox(prefix, args) {
        Ok((_params, mailbox)) => Some(mailbox),
        Err(e) => {
            debug!(%e, "failed to parse mailbox string {args:?}");
            None
        }
    }
}
