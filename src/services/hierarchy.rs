//! Разрешение иерархии башня → крыло → этаж.
//!
//! У проектов с `is_wing = false` каждая башня несёт единственное синтетическое
//! крыло (`is_default = true`, имя DEFAULT_WING); выбор крыла в этом случае
//! скрывается, а этажи ищутся напрямую под автоматически выбранным крылом.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Floor, TowerResponse, Wing};

/// Отображаемое имя синтетического крыла. Ветвление идёт по `is_default`,
/// а не по сравнению имени.
pub const DEFAULT_WING_NAME: &str = "DEFAULT_WING";

/// Результат разрешения крыла для выбранной башни.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WingSelection {
    /// Селектор скрыт, крыло выбрано автоматически
    Hidden { wing: Wing },
    /// Селектор показывается с этим списком
    Choose { wings: Vec<Wing> },
}

impl WingSelection {
    pub fn selected_wing_id(&self) -> Option<Uuid> {
        match self {
            WingSelection::Hidden { wing } => Some(wing.id),
            WingSelection::Choose { .. } => None,
        }
    }
}

pub fn wings_of_tower(tower_id: Uuid, wings: &[Wing]) -> Vec<Wing> {
    wings
        .iter()
        .filter(|w| w.tower_id == tower_id)
        .cloned()
        .collect()
}

/// Решает, показывать ли селектор крыла для башни.
///
/// Для проектов без крыльев селектор не показывается никогда; у такой башни
/// обязано существовать синтетическое крыло, его отсутствие — ошибка данных.
/// Для проектов с крыльями селектор скрывается, только если единственное крыло
/// башни — синтетическое.
pub fn resolve_wing_selection(
    project_is_wing: bool,
    tower_id: Uuid,
    wings: &[Wing],
) -> AppResult<WingSelection> {
    let mut filtered = wings_of_tower(tower_id, wings);

    if !project_is_wing {
        let wing = filtered
            .into_iter()
            .find(|w| w.is_default)
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "tower {} has no default wing in a non-wing project",
                    tower_id
                ))
            })?;
        return Ok(WingSelection::Hidden { wing });
    }

    if filtered.len() == 1 && filtered[0].is_default {
        return Ok(WingSelection::Hidden {
            wing: filtered.remove(0),
        });
    }

    Ok(WingSelection::Choose { wings: filtered })
}

pub fn floors_of_wing(wing_id: Uuid, floors: &[Floor]) -> Vec<Floor> {
    floors
        .iter()
        .filter(|f| f.wing_id == wing_id)
        .cloned()
        .collect()
}

/// Башни без единого крыла не попадают в выбор.
pub fn pickable_towers(towers: Vec<TowerResponse>) -> Vec<TowerResponse> {
    towers.into_iter().filter(|t| t.wing_count > 0).collect()
}

/// Текущий выбор в иерархии. Смена родителя синхронно сбрасывает всё ниже,
/// чтобы не осталось ссылки на этаж чужой башни.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HierarchySelection {
    pub tower_id: Option<Uuid>,
    pub wing_id: Option<Uuid>,
    pub floor_id: Option<Uuid>,
}

impl HierarchySelection {
    pub fn select_tower(&mut self, tower_id: Uuid) {
        if self.tower_id != Some(tower_id) {
            self.wing_id = None;
            self.floor_id = None;
        }
        self.tower_id = Some(tower_id);
    }

    pub fn select_wing(&mut self, wing_id: Uuid) {
        if self.wing_id != Some(wing_id) {
            self.floor_id = None;
        }
        self.wing_id = Some(wing_id);
    }

    pub fn select_floor(&mut self, floor_id: Uuid) {
        self.floor_id = Some(floor_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn wing(tower_id: Uuid, name: &str, is_default: bool) -> Wing {
        Wing {
            id: Uuid::new_v4(),
            tower_id,
            name: name.to_string(),
            is_default,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn floor(wing_id: Uuid, name: &str) -> Floor {
        Floor {
            id: Uuid::new_v4(),
            wing_id,
            name: name.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn non_wing_project_hides_selector_and_auto_selects_default() {
        let tower_id = Uuid::new_v4();
        let other_tower = Uuid::new_v4();
        let wings = vec![
            wing(tower_id, DEFAULT_WING_NAME, true),
            wing(other_tower, "A", false),
        ];

        let selection = resolve_wing_selection(false, tower_id, &wings).unwrap();
        match selection {
            WingSelection::Hidden { wing } => {
                assert!(wing.is_default);
                assert_eq!(wing.name, DEFAULT_WING_NAME);
                assert_eq!(wing.tower_id, tower_id);
            }
            WingSelection::Choose { .. } => panic!("selector must be hidden"),
        }
    }

    #[test]
    fn non_wing_project_without_default_wing_is_a_data_error() {
        let tower_id = Uuid::new_v4();
        let wings = vec![wing(tower_id, "A", false)];
        assert!(resolve_wing_selection(false, tower_id, &wings).is_err());
    }

    #[test]
    fn single_synthetic_wing_auto_selects_even_in_wing_project() {
        let tower_id = Uuid::new_v4();
        let wings = vec![wing(tower_id, DEFAULT_WING_NAME, true)];

        let selection = resolve_wing_selection(true, tower_id, &wings).unwrap();
        assert!(selection.selected_wing_id().is_some());
    }

    #[test]
    fn wing_project_with_real_wings_shows_selector() {
        let tower_id = Uuid::new_v4();
        let wings = vec![wing(tower_id, "A", false), wing(tower_id, "B", false)];

        let selection = resolve_wing_selection(true, tower_id, &wings).unwrap();
        match selection {
            WingSelection::Choose { wings } => assert_eq!(wings.len(), 2),
            WingSelection::Hidden { .. } => panic!("selector must be shown"),
        }
    }

    #[test]
    fn floors_filter_by_auto_selected_wing() {
        let tower_id = Uuid::new_v4();
        let wings = vec![wing(tower_id, DEFAULT_WING_NAME, true)];
        let selection = resolve_wing_selection(false, tower_id, &wings).unwrap();
        let wing_id = selection.selected_wing_id().unwrap();

        let floors = vec![floor(wing_id, "1"), floor(Uuid::new_v4(), "1")];
        let resolved = floors_of_wing(wing_id, &floors);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].wing_id, wing_id);
    }

    #[test]
    fn towers_without_wings_are_not_pickable() {
        let towers = vec![
            TowerResponse {
                id: Uuid::new_v4(),
                project_id: Uuid::new_v4(),
                name: "T1".to_string(),
                wing_count: 2,
            },
            TowerResponse {
                id: Uuid::new_v4(),
                project_id: Uuid::new_v4(),
                name: "T2".to_string(),
                wing_count: 0,
            },
        ];

        let pickable = pickable_towers(towers);
        assert_eq!(pickable.len(), 1);
        assert_eq!(pickable[0].name, "T1");
    }

    #[test]
    fn selecting_new_tower_resets_downstream_selection() {
        let mut selection = HierarchySelection::default();
        let t1 = Uuid::new_v4();
        let t2 = Uuid::new_v4();

        selection.select_tower(t1);
        selection.select_wing(Uuid::new_v4());
        selection.select_floor(Uuid::new_v4());

        selection.select_tower(t2);
        assert_eq!(selection.wing_id, None);
        assert_eq!(selection.floor_id, None);

        // повторный выбор той же башни ничего не сбрасывает
        selection.select_wing(Uuid::new_v4());
        selection.select_tower(t2);
        assert!(selection.wing_id.is_some());
    }

    #[test]
    fn selecting_new_wing_resets_floor() {
        let mut selection = HierarchySelection::default();
        selection.select_tower(Uuid::new_v4());
        selection.select_wing(Uuid::new_v4());
        selection.select_floor(Uuid::new_v4());

        selection.select_wing(Uuid::new_v4());
        assert_eq!(selection.floor_id, None);
    }
}
