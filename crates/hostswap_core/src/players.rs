use serde::{Deserialize, Serialize};

use crate::core_api::{CoreError, CoreErrorCode};
use crate::document::SaveDocument;
use crate::layout::SaveLayout;
use crate::markup::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerRole {
    Host,
    Farmhand,
}

/// Display fields of one player record. Values are the raw text from the
/// save; nothing is converted to numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlayerInfo {
    pub role: PlayerRole,
    /// Slot position in the farmhand container, `None` for the host.
    pub index: Option<usize>,
    pub name: Option<String>,
    pub farm_name: Option<String>,
    pub unique_id: Option<String>,
    pub money: Option<String>,
    pub total_money_earned: Option<String>,
    pub year: Option<String>,
    pub season: Option<String>,
    pub day_of_month: Option<String>,
    pub milliseconds_played: Option<String>,
}

impl PlayerInfo {
    fn from_record(
        record: &Element,
        role: PlayerRole,
        index: Option<usize>,
        layout: &SaveLayout,
    ) -> Self {
        let field = |tag: &str| record.child_text(tag).map(str::to_string);
        Self {
            role,
            index,
            name: field(&layout.name),
            farm_name: field("farmName"),
            unique_id: field(&layout.unique_id),
            money: field("money"),
            total_money_earned: field("totalMoneyEarned"),
            year: field("yearForSaveGame"),
            season: field("seasonForSaveGame"),
            day_of_month: field("dayOfMonthForSaveGame"),
            milliseconds_played: field("millisecondsPlayed"),
        }
    }
}

/// A player as listed to the user, borrowing the full record it came from.
#[derive(Debug, Clone)]
pub struct PlayerSummary<'a> {
    pub info: PlayerInfo,
    pub record: &'a Element,
}

#[derive(Debug, Clone)]
pub struct PlayerRoster<'a> {
    pub host: PlayerSummary<'a>,
    pub farmhands: Vec<PlayerSummary<'a>>,
}

impl<'a> PlayerRoster<'a> {
    /// Lists the host and every named farmhand. A save without a farmhand
    /// container yields an empty farmhand list.
    pub fn collect(save: &'a SaveDocument, layout: &SaveLayout) -> Result<Self, CoreError> {
        let host_record = save.host(layout)?;
        let host = PlayerSummary {
            info: PlayerInfo::from_record(host_record, PlayerRole::Host, None, layout),
            record: host_record,
        };

        let mut farmhands = Vec::new();
        if let Ok(slots) = save.farmhand_slots(layout) {
            for (index, record) in slots.into_iter().enumerate() {
                if !has_name(record, layout) {
                    continue;
                }
                farmhands.push(PlayerSummary {
                    info: PlayerInfo::from_record(
                        record,
                        PlayerRole::Farmhand,
                        Some(index),
                        layout,
                    ),
                    record,
                });
            }
        }

        Ok(Self { host, farmhands })
    }

    /// Looks a farmhand up by its slot position, not its position in the list.
    pub fn farmhand(&self, index: usize) -> Option<&PlayerSummary<'a>> {
        self.farmhands
            .iter()
            .find(|summary| summary.info.index == Some(index))
    }

    pub fn all(&self) -> impl Iterator<Item = &PlayerSummary<'a>> {
        std::iter::once(&self.host).chain(self.farmhands.iter())
    }
}

/// Lists the players of a save that has at least one farmhand to migrate to.
pub fn extract_players<'a>(
    save: &'a SaveDocument,
    layout: &SaveLayout,
) -> Result<PlayerRoster<'a>, CoreError> {
    let roster = PlayerRoster::collect(save, layout)?;
    if roster.farmhands.is_empty() {
        return Err(CoreError::new(
            CoreErrorCode::NoSecondaryPlayers,
            "save has no farmhands; there is no player to migrate the host to",
        ));
    }
    Ok(roster)
}

/// Empty farmhand slots have no name element or an empty one.
fn has_name(record: &Element, layout: &SaveLayout) -> bool {
    record
        .child_text(&layout.name)
        .is_some_and(|name| !name.is_empty())
}
