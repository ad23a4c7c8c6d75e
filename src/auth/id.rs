//! Strongly typed identifiers for the tenant, the application, and mailbox addresses.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal, $max:expr) => {
		def_id! { $name, $doc, $kind, $max, |_view: &str| Ok(()) }
	};
	($name:ident, $doc:literal, $kind:literal, $max:expr, $extra:expr) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				Self::validate(view)?;

				Ok(Self(view.to_owned()))
			}

			fn validate(view: &str) -> Result<(), IdentifierError> {
				validate_view($kind, view, $max)?;

				let extra: fn(&str) -> Result<(), IdentifierError> = $extra;

				extra(view)
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::validate(&value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!(stringify!($name), "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;
// RFC 5321 path limit.
const MAIL_ADDRESS_MAX_LEN: usize = 254;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (tenant, client, mail address).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (tenant, client, mail address).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (tenant, client, mail address).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
	/// The identifier does not have the expected shape.
	#[error("{kind} identifier is malformed: {reason}.")]
	Malformed {
		/// Kind of identifier (tenant, client, mail address).
		kind: &'static str,
		/// What is wrong with it.
		reason: &'static str,
	},
}

def_id! { TenantId, "Directory (tenant) identifier used to build the authority URL.", "Tenant", IDENTIFIER_MAX_LEN }
def_id! { ClientId, "Application (client) identifier registered with the identity provider.", "Client", IDENTIFIER_MAX_LEN }
def_id! {
	MailAddress,
	"Mailbox address used as a sender or recipient.",
	"Mail address",
	MAIL_ADDRESS_MAX_LEN,
	validate_mail_address
}

fn validate_view(kind: &'static str, view: &str, max: usize) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > max {
		return Err(IdentifierError::TooLong { kind, max });
	}

	Ok(())
}

fn validate_mail_address(view: &str) -> Result<(), IdentifierError> {
	const KIND: &str = "Mail address";

	match view.split_once('@') {
		Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
			Ok(()),
		_ => Err(IdentifierError::Malformed { kind: KIND, reason: "expected local@domain" }),
	}
}
