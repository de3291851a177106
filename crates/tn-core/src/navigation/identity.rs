//! Identity tags for managed views
//!
//! Every view the navigator places into a container carries an [`Identity`].
//! The string form is what the container stores, so a container that rebuilds
//! its views after process death hands back strings we can decode again.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Marks tags produced by this crate. Bump the version suffix if the layout changes.
pub const TAG_PREFIX: &str = "tabnav.v1";

const SEPARATOR: char = '|';
const TRANSITIONS_SEPARATOR: char = '.';
const DETACHABLE: &str = "DETACHABLE";

/// Custom animations a view asks for when it enters and when it is popped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transitions {
    pub enter: i32,
    pub exit: i32,
    pub pop_enter: i32,
    pub pop_exit: i32,
}

impl Transitions {
    pub fn new(enter: i32, exit: i32, pop_enter: i32, pop_exit: i32) -> Self {
        Self { enter, exit, pop_enter, pop_exit }
    }

    /// Animations used when the view is added
    pub fn open(&self) -> (i32, i32) {
        (self.enter, self.exit)
    }

    /// Animations used when the view is popped off its stack
    pub fn pop(&self) -> (i32, i32) {
        (self.pop_enter, self.pop_exit)
    }
}

impl fmt::Display for Transitions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}{sep}{}",
            self.enter,
            self.exit,
            self.pop_enter,
            self.pop_exit,
            sep = TRANSITIONS_SEPARATOR
        )
    }
}

impl Transitions {
    /// `Ok(None)` when the segment carries no transitions at all
    fn parse_segment(segment: &str) -> Result<Option<Self>, ForeignTag> {
        if !segment.contains(TRANSITIONS_SEPARATOR) {
            return Ok(None);
        }

        let values = segment
            .split(TRANSITIONS_SEPARATOR)
            .map(|part| part.parse::<i32>().map_err(|_| ForeignTag))
            .collect::<Result<Vec<_>, _>>()?;

        match values.as_slice() {
            [enter, exit, pop_enter, pop_exit] => {
                Ok(Some(Self::new(*enter, *exit, *pop_enter, *pop_exit)))
            }
            _ => Err(ForeignTag),
        }
    }
}

/// The tag did not come from this crate, or it is too mangled to trust
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("tag was not produced by the navigator")]
pub struct ForeignTag;

/// Stable identity of a view managed by the navigator.
///
/// Equality and hashing only look at the uuid; the rest is metadata.
#[derive(Debug, Clone)]
pub struct Identity {
    type_name: String,
    detachable: bool,
    uuid: Uuid,
    transitions: Option<Transitions>,
}

impl Identity {
    /// Create a fresh identity with a random uuid
    pub fn new(
        type_name: impl Into<String>,
        detachable: bool,
        transitions: Option<Transitions>,
    ) -> Self {
        let type_name = type_name.into();
        debug_assert!(
            !type_name.contains(SEPARATOR),
            "view type names must not contain '{}'",
            SEPARATOR
        );

        Self {
            type_name,
            detachable,
            uuid: Uuid::new_v4(),
            transitions,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn is_detachable(&self) -> bool {
        self.detachable
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn transitions(&self) -> Option<Transitions> {
        self.transitions
    }

    /// The string stored in the view container
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Decode a container tag. Anything we did not write yields [`ForeignTag`].
    pub fn decode(tag: &str) -> Result<Self, ForeignTag> {
        tag.parse()
    }

    /// Whether a raw container tag belongs to the navigator
    pub fn is_ours(tag: &str) -> bool {
        Self::decode(tag).is_ok()
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{prefix}{sep}{}{sep}{}{sep}{}{sep}",
            self.type_name,
            if self.detachable { DETACHABLE } else { "" },
            self.uuid,
            prefix = TAG_PREFIX,
            sep = SEPARATOR
        )?;
        if let Some(transitions) = &self.transitions {
            write!(f, "{}", transitions)?;
        }
        Ok(())
    }
}

impl FromStr for Identity {
    type Err = ForeignTag;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        if !tag.starts_with(TAG_PREFIX) {
            return Err(ForeignTag);
        }

        let fields: Vec<&str> = tag.split(SEPARATOR).collect();
        let (type_name, detachable, uuid, transitions) = match fields.as_slice() {
            [prefix, type_name, detachable, uuid] if *prefix == TAG_PREFIX => {
                (type_name, detachable, uuid, "")
            }
            [prefix, type_name, detachable, uuid, transitions] if *prefix == TAG_PREFIX => {
                (type_name, detachable, uuid, *transitions)
            }
            _ => return Err(ForeignTag),
        };

        let uuid = Uuid::parse_str(uuid).map_err(|_| ForeignTag)?;

        Ok(Self {
            type_name: (*type_name).to_string(),
            detachable: *detachable == DETACHABLE,
            uuid,
            transitions: Transitions::parse_segment(transitions)?,
        })
    }
}
