//! Nil-marker repair on serialized text.
//!
//! The game's deserializer wants `xsi:nil="true"` on optional fields that
//! hold no value, but an empty element in the tree cannot tell "empty string"
//! from "null". The patch therefore runs on the written text and only touches
//! empty, attribute-free occurrences of a known field.

use std::collections::BTreeSet;

use tracing::debug;

const NIL_ATTRIBUTE: &str = r#"xsi:nil="true""#;

/// Optional fields that must carry a nil marker when empty: relationship
/// references, boolean flags and lifetime counters.
pub const NULLABLE_FIELDS: &[&str] = &[
    "datingFarmer",
    "divorcedFromFarmer",
    "loveInterest",
    "endOfRouteBehaviorName",
    "isBigCraftable",
    "which",
    "catPerson",
    "canUnderstandDwarves",
    "hasClubCard",
    "hasDarkTalisman",
    "hasMagicInk",
    "hasMagnifyingGlass",
    "hasRustyKey",
    "hasSkullKey",
    "hasSpecialCharm",
    "HasTownKey",
    "hasUnlockedSkullDoor",
    "daysMarried",
    "isMale",
    "averageBedtime",
    "beveragesMade",
    "caveCarrotsFound",
    "cheeseMade",
    "chickenEggsLayed",
    "copperFound",
    "cowMilkProduced",
    "cropsShipped",
    "daysPlayed",
    "diamondsFound",
    "dirtHoed",
    "duckEggsLayed",
    "fishCaught",
    "geodesCracked",
    "giftsGiven",
    "goatCheeseMade",
    "goatMilkProduced",
    "goldFound",
    "goodFriends",
    "individualMoneyEarned",
    "iridiumFound",
    "ironFound",
    "itemsCooked",
    "itemsCrafted",
    "itemsForaged",
    "itemsShipped",
    "monstersKilled",
    "mysticStonesCrushed",
    "notesFound",
    "otherPreciousGemsFound",
    "piecesOfTrashRecycled",
    "preservesMade",
    "prismaticShardsFound",
    "questsCompleted",
    "rabbitWoolProduced",
    "rocksCrushed",
    "sheepWoolProduced",
    "slimesKilled",
    "stepsTaken",
    "stoneGathered",
    "stumpsChopped",
    "timesFished",
    "timesUnconscious",
    "totalMoneyGifted",
    "trufflesFound",
    "weedsEliminated",
    "seedsSown",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NilFieldRepair {
    fields: BTreeSet<String>,
}

impl Default for NilFieldRepair {
    fn default() -> Self {
        Self::new(NULLABLE_FIELDS.iter().copied())
    }
}

impl NilFieldRepair {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    pub fn repair(&self, text: &str) -> String {
        self.repair_counted(text).0
    }

    /// Rewrites every `<field></field>` and `<field />` of a known field to
    /// `<field xsi:nil="true" />` and reports how many were rewritten.
    pub fn repair_counted(&self, text: &str) -> (String, usize) {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        let mut repaired = 0usize;

        while let Some(lt) = rest.find('<') {
            out.push_str(&rest[..lt]);
            let candidate = &rest[lt..];
            match self.match_empty_field(candidate) {
                Some((field, consumed)) => {
                    out.push('<');
                    out.push_str(field);
                    out.push(' ');
                    out.push_str(NIL_ATTRIBUTE);
                    out.push_str(" />");
                    rest = &candidate[consumed..];
                    repaired += 1;
                }
                None => {
                    out.push('<');
                    rest = &candidate[1..];
                }
            }
        }
        out.push_str(rest);

        debug!(repaired, "applied nil-field repair");
        (out, repaired)
    }

    /// `candidate` starts at a `<`. Returns the field name and the length of
    /// the empty-element markup when it is one we repair.
    fn match_empty_field<'t>(&self, candidate: &'t str) -> Option<(&'t str, usize)> {
        let after_lt = &candidate[1..];
        let name_len = after_lt
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(after_lt.len());
        let field = &after_lt[..name_len];
        if field.is_empty() || !self.contains(field) {
            return None;
        }

        let after_name = &after_lt[name_len..];
        let tail = after_name.trim_start();
        let spaces = after_name.len() - tail.len();

        let tail_len = if tail.starts_with("/>") {
            2
        } else if let Some(after_open) = tail.strip_prefix('>') {
            let closing = format!("</{field}>");
            if !after_open.starts_with(&closing) {
                return None;
            }
            1 + closing.len()
        } else {
            return None;
        };

        Some((field, 1 + name_len + spaces + tail_len))
    }
}

/// Applies [`NilFieldRepair`] with the built-in field list.
pub fn repair_nil_fields(text: &str) -> String {
    NilFieldRepair::default().repair(text)
}
