//! Shared test support: a scriptable in-memory game API.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use goapbot::{ActionOutcome, ApiError, CharacterData, GameApi, InventorySlot, WorldSnapshot};

/// A character in a known-good starting condition at the origin tile.
pub fn test_character() -> CharacterData {
    CharacterData {
        name: "kiera".to_string(),
        level: 5,
        xp: 1200,
        gold: 30,
        hp: 100,
        max_hp: 100,
        x: 0,
        y: 0,
        cooldown_seconds: 0,
        mining_level: 1,
        woodcutting_level: 1,
        fishing_level: 1,
        weaponcrafting_level: 1,
        gearcrafting_level: 1,
        jewelrycrafting_level: 1,
        cooking_level: 1,
        alchemy_level: 1,
        inventory: vec![],
        inventory_max_items: 20,
        weapon_slot: String::new(),
        tool_slot: String::new(),
    }
}

/// An in-memory game server: tracks one character, applies each action's
/// real consequence, and records the calls it receives. Individual calls
/// can be scripted to fail.
pub struct MockGameApi {
    character: Mutex<CharacterData>,
    world: Arc<WorldSnapshot>,
    calls: Mutex<Vec<String>>,
    fight_error: Mutex<Option<ApiError>>,
    /// Test hook: make every move regress the character's level, to
    /// simulate a sub-plan that violates a parent invariant.
    pub level_drop_on_move: Mutex<bool>,
}

impl MockGameApi {
    pub fn new(character: CharacterData, world: Arc<WorldSnapshot>) -> Self {
        Self {
            character: Mutex::new(character),
            world,
            calls: Mutex::new(Vec::new()),
            fight_error: Mutex::new(None),
            level_drop_on_move: Mutex::new(false),
        }
    }

    /// The non-fetch calls received so far, in order.
    pub fn action_calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| *c != "fetch")
            .cloned()
            .collect()
    }

    pub fn all_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Scripts the next fight call to fail with the given error.
    pub fn fail_next_fight(&self, error: ApiError) {
        *self.fight_error.lock().unwrap() = Some(error);
    }

    pub fn character_snapshot(&self) -> CharacterData {
        self.character.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn outcome(&self) -> ActionOutcome {
        ActionOutcome {
            character: self.character.lock().unwrap().clone(),
            cooldown_seconds: 0,
        }
    }
}

#[async_trait]
impl GameApi for MockGameApi {
    async fn fetch_character(&self, _character_id: &str) -> Result<CharacterData, ApiError> {
        self.record("fetch");
        Ok(self.character.lock().unwrap().clone())
    }

    async fn move_character(
        &self,
        _character_id: &str,
        x: i64,
        y: i64,
    ) -> Result<ActionOutcome, ApiError> {
        self.record(format!("move({},{})", x, y));
        {
            let mut character = self.character.lock().unwrap();
            character.x = x;
            character.y = y;
            if *self.level_drop_on_move.lock().unwrap() {
                character.level -= 1;
            }
        }
        Ok(self.outcome())
    }

    async fn fight(&self, _character_id: &str) -> Result<ActionOutcome, ApiError> {
        self.record("fight");
        if let Some(error) = self.fight_error.lock().unwrap().take() {
            return Err(error);
        }
        {
            let mut character = self.character.lock().unwrap();
            let on_monster_tile = self
                .world
                .tile_at(character.x, character.y)
                .map(|t| t.has_content_type("monster"))
                .unwrap_or(false);
            if !on_monster_tile {
                return Err(ApiError::NotFound("monster".to_string()));
            }
            character.xp += 100;
            character.level += 1;
            character.hp = (character.hp - 20).max(1);
        }
        Ok(self.outcome())
    }

    async fn gather(&self, _character_id: &str) -> Result<ActionOutcome, ApiError> {
        self.record("gather");
        {
            let mut character = self.character.lock().unwrap();
            let resource_code = self
                .world
                .tile_at(character.x, character.y)
                .and_then(|t| t.content.as_ref())
                .filter(|c| c.content_type == "resource")
                .map(|c| c.code.clone());
            match resource_code {
                Some(code) => character.inventory.push(InventorySlot { code, quantity: 1 }),
                None => return Err(ApiError::NotFound("resource".to_string())),
            }
        }
        Ok(self.outcome())
    }

    async fn rest(&self, _character_id: &str) -> Result<ActionOutcome, ApiError> {
        self.record("rest");
        {
            let mut character = self.character.lock().unwrap();
            character.hp = character.max_hp;
        }
        Ok(self.outcome())
    }

    async fn craft(&self, _character_id: &str, item_code: &str) -> Result<ActionOutcome, ApiError> {
        self.record(format!("craft({})", item_code));
        {
            let mut character = self.character.lock().unwrap();
            character.inventory.push(InventorySlot {
                code: item_code.to_string(),
                quantity: 1,
            });
        }
        Ok(self.outcome())
    }

    async fn equip(&self, _character_id: &str, item_code: &str) -> Result<ActionOutcome, ApiError> {
        self.record(format!("equip({})", item_code));
        {
            let mut character = self.character.lock().unwrap();
            character.weapon_slot = item_code.to_string();
            character.inventory.retain(|slot| slot.code != item_code);
        }
        Ok(self.outcome())
    }

    async fn bank_deposit_all(&self, _character_id: &str) -> Result<ActionOutcome, ApiError> {
        self.record("deposit");
        {
            let mut character = self.character.lock().unwrap();
            character.inventory.clear();
        }
        Ok(self.outcome())
    }
}
