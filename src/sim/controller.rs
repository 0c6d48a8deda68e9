//! Command dispatch
//!
//! The `Controller` owns the game state, the board, the visibility window and
//! the store. Each command runs to completion: validate, mutate, refresh the
//! window, write the snapshot, return the new view.

use glam::DVec2;

use super::command::Command;
use super::ledger::Coin;
use super::state::{GameState, ObserverState};
use super::view::{CacheView, View};
use super::window::{VisibilityWindow, WindowUpdate};
use crate::error::{GameError, StorageError};
use crate::grid::{Board, Cell};
use crate::persistence::{KeyValueStore, PersistedGameState};
use crate::settings::WorldConfig;

pub struct Controller<S: KeyValueStore> {
    config: WorldConfig,
    board: Board,
    window: VisibilityWindow,
    state: GameState,
    store: S,
    /// Position feed on/off
    tracking: bool,
    /// Window changes not yet handed out in a view
    changes: WindowUpdate,
    storage_fault: Option<String>,
}

impl<S: KeyValueStore> Controller<S> {
    /// Load the saved game from `store` (or start fresh) and build the
    /// initial window
    pub fn load(config: WorldConfig, store: S) -> Self {
        let config = config.sanitized();
        let mut board = Board::new(config.tile_degrees);
        let saved = PersistedGameState::read(&store);

        let position = saved
            .position
            .filter(|p| p.is_finite())
            .unwrap_or(config.start_position);
        let cell = *board.cell_for_position(position);
        if saved.cell.is_some_and(|c| c != cell) {
            log::warn!("Saved cell disagrees with saved position, using {}", cell);
        }

        let mut observer = ObserverState::new(position, cell);
        observer.coins = saved.coins.clone();
        if !saved.path.is_empty() {
            observer.path = saved.path.clone();
        }
        let mut state = GameState::new(observer);
        for ledger in saved.ledgers() {
            state.insert_cache(ledger);
        }
        log::info!(
            "Loaded game at {}: {} saved caches, {} coins held",
            cell,
            state.cache_count(),
            state.observer.coins.len()
        );

        let mut controller = Self {
            window: VisibilityWindow::new(config.visibility_radius),
            config,
            board,
            state,
            store,
            tracking: false,
            changes: WindowUpdate::default(),
            storage_fault: None,
        };
        controller.changes = controller.refresh();
        // Fresh spawns are state too; a failure is already logged and
        // surfaced through `storage_fault`
        let _ = controller.persist();
        controller
    }

    /// Run one command
    pub fn apply(&mut self, command: Command) -> Result<View, GameError> {
        match command {
            Command::Move(direction) => {
                let target =
                    self.state.observer.position + direction.offset(self.config.tile_degrees);
                self.move_to(target)?;
            }
            Command::PositionUpdate { lat, lng } => {
                if !self.tracking {
                    return Err(GameError::TrackingDisabled);
                }
                let target = DVec2::new(lat, lng);
                if !target.is_finite() {
                    return Err(self.lose_position());
                }
                self.move_to(target)?;
            }
            Command::PositionUnavailable => return Err(self.lose_position()),
            Command::SetTracking(on) => {
                if on != self.tracking {
                    log::info!("Position tracking {}", if on { "on" } else { "off" });
                }
                self.tracking = on;
            }
            Command::Collect(cell) => {
                self.check_reach(cell)?;
                let coin = self.state.collect(cell)?;
                log::info!("Collected {} from {}", coin, cell);
                self.persist()?;
            }
            Command::Deposit(cell) => {
                self.check_reach(cell)?;
                let coin = self.state.deposit(cell)?;
                log::info!("Deposited {} into {}", coin, cell);
                self.persist()?;
            }
            Command::Reset => self.reset()?,
        }
        Ok(self.take_view())
    }

    /// Current view. Pending window changes are included but stay pending.
    pub fn view(&self) -> View {
        self.build_view(self.changes.clone())
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn tracking(&self) -> bool {
        self.tracking
    }

    pub fn is_visible(&self, cell: Cell) -> bool {
        self.window.is_visible(cell)
    }

    pub fn inventory(&self) -> &[Coin] {
        &self.state.observer.coins
    }

    fn move_to(&mut self, position: DVec2) -> Result<(), StorageError> {
        let cell = *self.board.cell_for_position(position);
        self.state.observer.move_to(position, cell);
        let update = self.refresh();
        self.changes.merge(update);
        self.persist()
    }

    fn lose_position(&mut self) -> GameError {
        if self.tracking {
            log::warn!("Position unavailable, tracking disabled");
        }
        self.tracking = false;
        GameError::PositionUnavailable
    }

    fn check_reach(&self, cell: Cell) -> Result<(), GameError> {
        if !self.state.has_cache(cell) {
            return Err(GameError::NoCache(cell));
        }
        if cell.distance(self.state.observer.cell) > self.config.interaction_radius {
            return Err(GameError::OutOfReach(cell));
        }
        Ok(())
    }

    fn refresh(&mut self) -> WindowUpdate {
        let position = self.state.observer.position;
        self.window.refresh(
            &mut self.board,
            &mut self.state,
            self.config.spawn_rules(),
            position,
        )
    }

    fn reset(&mut self) -> Result<(), StorageError> {
        let cleared = self.store.clear();

        let start = self.config.start_position;
        let cell = *self.board.cell_for_position(start);
        self.state = GameState::new(ObserverState::new(start, cell));
        self.window.clear();
        let mut update = self.refresh();
        update.cleared = true;
        self.changes = update;
        log::info!(
            "Game reset at {}, {} caches in view",
            cell,
            self.state.cache_count()
        );

        if let Err(e) = cleared {
            log::error!("Failed to clear saved game: {}", e);
            self.storage_fault = Some(e.to_string());
            return Err(e);
        }
        self.persist()
    }

    /// Write the whole snapshot. On failure the in-memory state stands.
    fn persist(&mut self) -> Result<(), StorageError> {
        let result =
            PersistedGameState::capture(&self.state).and_then(|snapshot| snapshot.write(&mut self.store));
        match &result {
            Ok(()) => self.storage_fault = None,
            Err(e) => {
                log::error!("Failed to save game: {}", e);
                self.storage_fault = Some(e.to_string());
            }
        }
        result
    }

    /// Current view, handing out the pending window changes
    ///
    /// Right after `load` the pending changes are the startup window (every
    /// cache shown, plus what was spawned to fill it). Each later `apply`
    /// returns its own changes through this.
    pub fn take_view(&mut self) -> View {
        let changes = std::mem::take(&mut self.changes);
        self.build_view(changes)
    }

    fn build_view(&self, changes: WindowUpdate) -> View {
        let observer = &self.state.observer;
        let caches = self
            .state
            .caches()
            .map(|ledger| {
                let cell = ledger.cell();
                let bounds = self.board.bounds_of(cell);
                CacheView {
                    cell,
                    bounds,
                    center: bounds.center(),
                    coins: ledger.snapshot(),
                    visible: self.window.is_visible(cell),
                    in_reach: cell.distance(observer.cell) <= self.config.interaction_radius,
                }
            })
            .collect();

        View {
            position: observer.position,
            cell: observer.cell,
            inventory: observer.coins.clone(),
            path: observer.path.clone(),
            tracking: self.tracking,
            caches,
            changes,
            storage_fault: self.storage_fault.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::luck;
    use crate::persistence::{MemoryStore, keys};
    use crate::sim::{Direction, testing};

    /// Power-of-two tile keeps step arithmetic exact
    const TILE: f64 = 1.0 / 1024.0;

    fn config_at(cell: Cell) -> WorldConfig {
        WorldConfig {
            tile_degrees: TILE,
            start_position: DVec2::new(
                (f64::from(cell.i) + 0.5) * TILE,
                (f64::from(cell.j) + 0.5) * TILE,
            ),
            ..WorldConfig::default()
        }
    }

    /// First cell (scanning outward) whose fresh cache holds `count` coins
    fn cell_with_coins(config: &WorldConfig, count: u32) -> Cell {
        for i in 0..400 {
            for j in 0..400 {
                let cell = Cell::new(i, j);
                if luck::spawns_cache(cell, config.spawn_probability)
                    && luck::initial_coin_count(cell, config.max_initial_coins) == count
                {
                    return cell;
                }
            }
        }
        panic!("no cache with {count} coins in search area");
    }

    fn expected_visible(origin: Cell, config: &WorldConfig) -> Vec<Cell> {
        testing::expected_visible(origin, config.visibility_radius, config.spawn_probability)
    }

    /// Store whose writes can be switched off
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        broken: bool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.broken {
                return Err(StorageError::WriteRejected(key.to_string()));
            }
            self.inner.set(key, value)
        }

        fn clear(&mut self) -> Result<(), StorageError> {
            self.inner.clear()
        }
    }

    #[test]
    fn test_startup_materializes_window_and_saves() {
        let config = config_at(Cell::new(0, 0));
        let controller = Controller::load(config.clone(), MemoryStore::default());
        let view = controller.view();

        let mut visible: Vec<Cell> = view.visible_caches().map(|c| c.cell).collect();
        visible.sort();
        assert_eq!(visible, expected_visible(Cell::new(0, 0), &config));
        assert_eq!(view.path.len(), 1);
        assert!(view.storage_fault.is_none());

        let store = controller.into_store();
        for key in keys::ALL {
            assert!(store.get(key).unwrap().is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_collect_then_reset_scenario() {
        let base = WorldConfig::default();
        let cache = cell_with_coins(&base, 5);
        let config = config_at(cache);
        let mut controller = Controller::load(config.clone(), MemoryStore::default());
        let total = controller.state().total_coins();

        let view = controller.apply(Command::Collect(cache)).unwrap();
        assert_eq!(view.cache(cache).unwrap().coins.len(), 4);
        assert_eq!(view.inventory, vec![Coin::new(cache, 0)]);
        assert_eq!(controller.state().total_coins(), total);

        controller.apply(Command::Move(Direction::North)).unwrap();
        let view = controller.apply(Command::Reset).unwrap();
        assert!(view.changes.cleared);
        assert!(view.inventory.is_empty());
        assert_eq!(view.path, vec![config.start_position]);
        assert_eq!(view.cache(cache).unwrap().coins.len(), 5);

        // A fresh load after reset sees only luck-generated caches
        let reloaded = Controller::load(config.clone(), controller.into_store());
        assert_eq!(reloaded.state().cache(cache).unwrap().len(), 5);
        assert_eq!(
            reloaded.state().cache_count(),
            expected_visible(cache, &config).len()
        );
        assert!(reloaded.inventory().is_empty());
    }

    #[test]
    fn test_mutations_survive_reload() {
        let base = WorldConfig::default();
        let cache = cell_with_coins(&base, 3);
        let config = config_at(cache);
        let mut controller = Controller::load(config.clone(), MemoryStore::default());
        controller.apply(Command::Collect(cache)).unwrap();
        controller.apply(Command::Collect(cache)).unwrap();
        for _ in 0..20 {
            controller.apply(Command::Move(Direction::East)).unwrap();
        }
        assert!(!controller.is_visible(cache));

        let mut reloaded = Controller::load(config, controller.into_store());
        assert_eq!(reloaded.state().cache(cache).unwrap().len(), 1);
        assert_eq!(reloaded.inventory().len(), 2);
        assert_eq!(reloaded.state().observer.path.len(), 21);
        assert_eq!(reloaded.state().observer.cell, cache.offset(0, 20));

        for _ in 0..20 {
            reloaded.apply(Command::Move(Direction::West)).unwrap();
        }
        assert!(reloaded.is_visible(cache));
        assert_eq!(reloaded.state().cache(cache).unwrap().len(), 1);
    }

    #[test]
    fn test_step_east_scenario() {
        let config = config_at(Cell::new(0, 0));
        let mut controller = Controller::load(config.clone(), MemoryStore::default());
        let startup = controller.take_view();
        let initial = expected_visible(Cell::new(0, 0), &config);
        assert_eq!(startup.changes.shown, initial);
        assert_eq!(startup.changes.spawned.len(), initial.len());
        assert!(controller.view().changes.is_empty());

        let before: Vec<(Cell, usize)> = controller
            .state()
            .caches()
            .map(|c| (c.cell(), c.len()))
            .collect();

        let view = controller.apply(Command::Move(Direction::East)).unwrap();
        assert_eq!(view.cell, Cell::new(0, 1));
        assert!(view.changes.spawned.iter().all(|c| c.j == 9));
        assert!(view.changes.hidden.iter().all(|c| c.j == -8));
        for (cell, len) in before {
            assert_eq!(controller.state().cache(cell).unwrap().len(), len);
        }
        let mut visible: Vec<Cell> = view.visible_caches().map(|c| c.cell).collect();
        visible.sort();
        assert_eq!(visible, expected_visible(Cell::new(0, 1), &config));
    }

    #[test]
    fn test_first_apply_carries_startup_changes_if_untaken() {
        let config = config_at(Cell::new(0, 0));
        let mut controller = Controller::load(config.clone(), MemoryStore::default());
        let view = controller.apply(Command::SetTracking(true)).unwrap();
        assert_eq!(view.changes.shown, expected_visible(Cell::new(0, 0), &config));

        let view = controller.apply(Command::SetTracking(false)).unwrap();
        assert!(view.changes.is_empty());
    }

    #[test]
    fn test_rejections_do_not_change_state() {
        let base = WorldConfig::default();
        let cache = cell_with_coins(&base, 0);
        let config = config_at(cache);
        let mut controller = Controller::load(config, MemoryStore::default());
        let before = controller.view();

        assert!(matches!(
            controller.apply(Command::Collect(cache)),
            Err(GameError::EmptyLedger(_))
        ));
        assert!(matches!(
            controller.apply(Command::Deposit(cache)),
            Err(GameError::EmptyInventory)
        ));
        let far = controller
            .view()
            .caches
            .iter()
            .map(|c| c.cell)
            .find(|c| c.distance(cache) > 1);
        if let Some(far) = far {
            assert!(matches!(
                controller.apply(Command::Collect(far)),
                Err(GameError::OutOfReach(_))
            ));
        }
        let nowhere = (0..)
            .map(|k| Cell::new(cache.i + 1, cache.j + k))
            .find(|c| !controller.state().has_cache(*c))
            .unwrap();
        assert!(matches!(
            controller.apply(Command::Collect(nowhere)),
            Err(GameError::NoCache(_))
        ));

        let after = controller.view();
        assert_eq!(after.caches, before.caches);
        assert_eq!(after.inventory, before.inventory);
    }

    #[test]
    fn test_position_feed() {
        let config = config_at(Cell::new(0, 0));
        let mut controller = Controller::load(config, MemoryStore::default());

        let update = Command::PositionUpdate {
            lat: 10.5 * TILE,
            lng: -3.5 * TILE,
        };
        assert!(matches!(
            controller.apply(update),
            Err(GameError::TrackingDisabled)
        ));
        assert_eq!(controller.state().observer.cell, Cell::new(0, 0));

        controller.apply(Command::SetTracking(true)).unwrap();
        let view = controller.apply(update).unwrap();
        assert_eq!(view.cell, Cell::new(10, -4));

        assert!(matches!(
            controller.apply(Command::PositionUnavailable),
            Err(GameError::PositionUnavailable)
        ));
        assert!(!controller.tracking());
        assert_eq!(controller.state().observer.cell, Cell::new(10, -4));
        assert!(matches!(
            controller.apply(Command::PositionUpdate { lat: 0.0, lng: 0.0 }),
            Err(GameError::TrackingDisabled)
        ));
    }

    #[test]
    fn test_storage_failure_keeps_memory_state() {
        let base = WorldConfig::default();
        let cache = cell_with_coins(&base, 4);
        let mut controller = Controller::load(config_at(cache), FlakyStore::default());
        controller.store.broken = true;

        let err = controller.apply(Command::Collect(cache)).unwrap_err();
        assert!(matches!(err, GameError::Storage(_)));
        assert!(!err.is_rejection());
        assert_eq!(controller.inventory().len(), 1);
        assert!(controller.view().storage_fault.is_some());

        controller.store.broken = false;
        let view = controller.apply(Command::Move(Direction::South)).unwrap();
        assert!(view.storage_fault.is_none());
        let reloaded = Controller::load(config_at(cache), controller.into_store());
        assert_eq!(reloaded.inventory().len(), 1);
    }

    #[test]
    fn test_corrupt_save_loads_what_it_can() {
        let base = WorldConfig::default();
        let cache = cell_with_coins(&base, 6);
        let config = config_at(cache);
        let mut controller = Controller::load(config.clone(), MemoryStore::default());
        controller.apply(Command::Collect(cache)).unwrap();
        let mut store = controller.into_store();
        store.set(keys::POSITION, "garbage").unwrap();
        store.set(keys::PATH, "{").unwrap();

        let reloaded = Controller::load(config.clone(), store);
        assert_eq!(reloaded.state().observer.position, config.start_position);
        assert_eq!(reloaded.state().observer.path, vec![config.start_position]);
        assert_eq!(reloaded.inventory().len(), 1);
        assert_eq!(reloaded.state().cache(cache).unwrap().len(), 5);
    }

    #[test]
    fn test_malformed_cache_entry_does_not_remint() {
        let base = WorldConfig::default();
        let cache = cell_with_coins(&base, 5);
        let config = config_at(cache);
        let mut controller = Controller::load(config.clone(), MemoryStore::default());
        controller.apply(Command::Collect(cache)).unwrap();
        let total = controller.state().total_coins();

        let mut store = controller.into_store();
        let raw = store.get(keys::CACHES).unwrap().unwrap();
        let mut entries: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
        entries.push(serde_json::json!({"i": 999, "j": 999}));
        entries.push(serde_json::json!({"j": 3}));
        store
            .set(keys::CACHES, &serde_json::Value::from(entries).to_string())
            .unwrap();

        let reloaded = Controller::load(config, store);
        assert_eq!(reloaded.state().cache(cache).unwrap().len(), 4);
        assert_eq!(reloaded.state().total_coins(), total);
        assert_eq!(reloaded.inventory().len(), 1);
    }
}
