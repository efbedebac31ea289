use crate::companion;
use crate::document::{CompanionDocument, SaveDocument};
use crate::layout::{CompanionLayout, MigrationRules};
use crate::migration::{self, MigrationReport};
use crate::players::{PlayerRoster, extract_players};
use crate::repair::NilFieldRepair;

use super::error::{CoreError, CoreErrorCode};
use super::save_folder::SaveTexts;

#[derive(Debug, Default, Clone)]
pub struct Engine {
    rules: MigrationRules,
    companion_layout: CompanionLayout,
    nil_repair: NilFieldRepair,
}

#[derive(Debug, Clone)]
pub struct Session {
    engine: Engine,
    save: SaveDocument,
    companion: Option<CompanionDocument>,
    last_migration: Option<MigrationReport>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(mut self, rules: MigrationRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_companion_layout(mut self, layout: CompanionLayout) -> Self {
        self.companion_layout = layout;
        self
    }

    pub fn with_nil_repair(mut self, nil_repair: NilFieldRepair) -> Self {
        self.nil_repair = nil_repair;
        self
    }

    pub fn rules(&self) -> &MigrationRules {
        &self.rules
    }

    pub fn open(
        &self,
        save_text: &str,
        companion_text: Option<&str>,
    ) -> Result<Session, CoreError> {
        let save = SaveDocument::parse(save_text, &self.rules.layout)?;
        let companion = companion_text
            .map(|text| CompanionDocument::parse(text, &self.companion_layout))
            .transpose()?;

        Ok(Session {
            engine: self.clone(),
            save,
            companion,
            last_migration: None,
        })
    }

    pub fn open_texts(&self, texts: &SaveTexts) -> Result<Session, CoreError> {
        self.open(&texts.main, texts.companion.as_deref())
    }
}

impl Session {
    pub fn save(&self) -> &SaveDocument {
        &self.save
    }

    pub fn companion(&self) -> Option<&CompanionDocument> {
        self.companion.as_ref()
    }

    pub fn last_migration(&self) -> Option<&MigrationReport> {
        self.last_migration.as_ref()
    }

    /// Host plus named farmhands; an empty farmhand list is not an error here.
    pub fn roster(&self) -> Result<PlayerRoster<'_>, CoreError> {
        PlayerRoster::collect(&self.save, &self.engine.rules.layout)
    }

    /// Like [`Session::roster`] but fails when nobody could become host.
    pub fn migration_candidates(&self) -> Result<PlayerRoster<'_>, CoreError> {
        extract_players(&self.save, &self.engine.rules.layout)
    }

    /// Makes the named farmhand in slot `target_index` the host and mirrors
    /// the new host into the companion document, if one was loaded.
    pub fn migrate_host(&mut self, target_index: usize) -> Result<MigrationReport, CoreError> {
        {
            let roster = self.migration_candidates()?;
            if roster.farmhand(target_index).is_none() {
                let valid = roster
                    .farmhands
                    .iter()
                    .filter_map(|summary| summary.info.index)
                    .map(|index| index.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(CoreError::new(
                    CoreErrorCode::IndexOutOfRange,
                    format!("no named farmhand in slot {target_index}; valid slots: {valid}"),
                ));
            }
        }
        if let Some(companion) = &self.companion {
            let expected = &self.engine.companion_layout.root;
            if &companion.record().tag != expected {
                return Err(CoreError::missing(format!("companion record <{expected}>")));
            }
        }

        let report =
            migration::migrate_host_in_place(&mut self.save, target_index, &self.engine.rules)?;

        if let Some(companion) = self.companion.as_mut() {
            let new_host = self.save.host(&self.engine.rules.layout)?;
            companion::replace_record(companion, new_host, &self.engine.companion_layout)?;
        }

        self.last_migration = Some(report.clone());
        Ok(report)
    }

    /// Main save as it should be written to disk.
    pub fn render_save(&self) -> String {
        self.engine.nil_repair.repair(&self.save.to_markup())
    }

    /// Companion document as it should be written to disk.
    pub fn render_companion(&self) -> Option<String> {
        self.companion
            .as_ref()
            .map(|companion| self.engine.nil_repair.repair(&companion.to_markup()))
    }
}
