//! Tag names and field tables describing the two save-file shapes.

pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Fields tied to the host/farmhand role rather than to the character:
/// house tier, spawn points, seen cutscenes and mail that unlocks shared
/// infrastructure (minecarts, bus, bridges).
pub const COUPLED_FIELDS: [&str; 5] = [
    "houseUpgradeLevel",
    "homeLocation",
    "lastSleepLocation",
    "eventsSeen",
    "mailReceived",
];

/// The in-game date a record was last saved at.
pub const SAVE_DATE_FIELDS: [&str; 3] = [
    "dayOfMonthForSaveGame",
    "seasonForSaveGame",
    "yearForSaveGame",
];

/// Where things live in the main save document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveLayout {
    pub root: String,
    pub host: String,
    pub farmhand_container: String,
    pub farmhand_record: String,
    pub unique_id: String,
    pub name: String,
    pub reference_field: String,
}

impl Default for SaveLayout {
    fn default() -> Self {
        Self {
            root: "SaveGame".to_string(),
            host: "player".to_string(),
            farmhand_container: "farmhands".to_string(),
            farmhand_record: "Farmer".to_string(),
            unique_id: "UniqueMultiplayerID".to_string(),
            name: "name".to_string(),
            reference_field: "farmhandReference".to_string(),
        }
    }
}

/// Shape of the single-record companion document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionLayout {
    pub root: String,
    pub required_attributes: Vec<(String, String)>,
}

impl Default for CompanionLayout {
    fn default() -> Self {
        Self {
            root: "Farmer".to_string(),
            required_attributes: vec![
                ("xmlns:xsi".to_string(), XSI_NAMESPACE.to_string()),
                ("xmlns:xsd".to_string(), XSD_NAMESPACE.to_string()),
            ],
        }
    }
}

/// Everything the migration engine needs to know about field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRules {
    pub layout: SaveLayout,
    pub coupled_fields: Vec<String>,
    pub date_fields: Vec<String>,
}

impl Default for MigrationRules {
    fn default() -> Self {
        Self {
            layout: SaveLayout::default(),
            coupled_fields: COUPLED_FIELDS.iter().map(|f| (*f).to_string()).collect(),
            date_fields: SAVE_DATE_FIELDS.iter().map(|f| (*f).to_string()).collect(),
        }
    }
}
