//! Arena Simulation Core
//!
//! This crate contains the deterministic, fixed-timestep snake match
//! simulation. It is the authoritative source of truth for snake positions,
//! collisions, food, scores and the terminal outcome of a match.
//!
//! # Architecture Constraints
//!
//! The Simulation Core MUST NOT:
//! - Perform I/O operations (file, network, etc.)
//! - Read wall-clock time
//! - Use ambient/unseeded randomness
//! - Depend on frame rate or variable delta time
//!
//! The only randomness is food relocation, driven by a `Pcg32` seeded at
//! match construction, so an entire match replays identically from its
//! configuration and input stream. All external communication occurs through
//! the orchestration layer, which calls [`Game::advance`] once per tick and
//! broadcasts [`Game::snapshot`].

#![deny(unsafe_code)]

use std::collections::VecDeque;

use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// A single discrete simulation timestep; the atomic unit of match time.
pub type Tick = u64;

// ============================================================================
// Core Types
// ============================================================================

/// One of the two participant slots in a match.
///
/// The orchestration layer owns the binding between slots and session
/// identities; the simulation only ever speaks in slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerSlot {
    One,
    Two,
}

impl PlayerSlot {
    /// Both slots, in slot order.
    pub const BOTH: [PlayerSlot; 2] = [PlayerSlot::One, PlayerSlot::Two];

    /// Array index for per-slot state.
    pub fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }

    /// The opposing slot.
    pub fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }
}

/// A grid cell in arena coordinates. The origin is the top-left corner;
/// `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one step in `dir`.
    fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Cardinal heading of a snake. The input model is 90-degree turns only;
/// diagonal movement does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Grid delta for one step in this direction.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// The reverse direction. A request to turn into the reverse of the
    /// current heading is ignored by [`Game::advance`] so a single bad
    /// keypress cannot fold a snake into its own neck.
    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Terminal state of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Match still running.
    Pending,
    /// Exactly one snake survived the deciding tick.
    Win(PlayerSlot),
    /// Both snakes died in the same tick, or the tick limit was reached.
    Draw,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Default arena width in cells.
pub const DEFAULT_ARENA_WIDTH: i32 = 40;

/// Default arena height in cells.
pub const DEFAULT_ARENA_HEIGHT: i32 = 30;

/// Fairness backstop: a match that reaches this many ticks without a death
/// resolves as a draw.
pub const DEFAULT_MAX_TICKS: u64 = 3600;

/// Initial snake length in cells. The fixed starting placements put each
/// head this many cells away from its rear wall.
pub const INITIAL_SNAKE_LEN: usize = 3;

/// Match configuration. Arena geometry, the tick limit and the RNG seed are
/// server-owned values; clients never supply them.
#[derive(Debug, Clone, Copy)]
pub struct MatchConfig {
    pub width: i32,
    pub height: i32,
    pub max_ticks: u64,
    pub seed: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_ARENA_WIDTH,
            height: DEFAULT_ARENA_HEIGHT,
            max_ticks: DEFAULT_MAX_TICKS,
            seed: 0,
        }
    }
}

/// Match construction failure. Fatal for the match being built, never for
/// the process: the orchestration layer refuses the match and logs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Arena too small to hold the two fixed starting snakes disjointly
    /// plus a food cell.
    #[error("arena {width}x{height} too small for two snakes and food (minimum {min}x{min})")]
    ArenaTooSmall { width: i32, height: i32, min: i32 },
    /// A tick limit of zero would end every match before its first tick.
    #[error("max_ticks must be positive")]
    ZeroTickLimit,
}

/// Minimum arena side length for the fixed starting placements.
const MIN_ARENA_SIDE: i32 = 6;

// ============================================================================
// Snake
// ============================================================================

/// One snake agent: an ordered run of grid cells, head first.
#[derive(Debug, Clone)]
struct Snake {
    /// Occupied cells, head at the front. Length never drops below 1.
    cells: VecDeque<Cell>,
    heading: Direction,
    alive: bool,
    /// Set when food is eaten; consumed at the next tail-drop decision so
    /// growth lands exactly one tick after the meal.
    pending_growth: bool,
    score: u32,
}

impl Snake {
    /// Build a snake of `INITIAL_SNAKE_LEN` cells with the body trailing
    /// away from `heading`.
    fn place(head: Cell, heading: Direction) -> Self {
        let (dx, dy) = heading.opposite().delta();
        let cells = (0..INITIAL_SNAKE_LEN as i32)
            .map(|i| Cell::new(head.x + dx * i, head.y + dy * i))
            .collect();
        Self {
            cells,
            heading,
            alive: true,
            pending_growth: false,
            score: 0,
        }
    }

    fn head(&self) -> Cell {
        *self.cells.front().expect("snake length >= 1")
    }

    fn occupies(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    fn to_snapshot(&self) -> SnakeSnapshot {
        SnakeSnapshot {
            cells: self.cells.iter().copied().collect(),
            heading: self.heading,
            alive: self.alive,
            score: self.score,
        }
    }
}

// ============================================================================
// Snapshots
// ============================================================================

/// Per-snake view embedded in [`GameSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnakeSnapshot {
    /// Occupied cells, head first. Always within arena bounds.
    pub cells: Vec<Cell>,
    pub heading: Direction,
    pub alive: bool,
    pub score: u32,
}

/// Full post-resolution match state, broadcast after every tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSnapshot {
    pub tick: Tick,
    /// Snakes in slot order.
    pub players: [SnakeSnapshot; 2],
    pub food: Cell,
    pub outcome: Outcome,
}

// ============================================================================
// Game
// ============================================================================

/// The authoritative simulation state for one match.
///
/// Owned exclusively by that match's tick driver; no other component mutates
/// snake positions. Advancing from tick T to T+1 applies at most one buffered
/// direction per snake, moves both heads, resolves collisions against the
/// post-move board and relocates food.
#[derive(Debug, Clone)]
pub struct Game {
    config: MatchConfig,
    tick: Tick,
    snakes: [Snake; 2],
    food: Cell,
    rng: Pcg32,
    outcome: Outcome,
}

impl Game {
    /// Create a match with both snakes at their fixed, deterministic starting
    /// positions and food at the first free cell at or after the arena
    /// center.
    ///
    /// Snake one starts at (2, 2) heading right with its body extending left
    /// to the wall; snake two starts at (width-3, height-3) heading left with
    /// its body extending right to the wall.
    pub fn new(config: MatchConfig) -> Result<Self, ConfigError> {
        if config.width < MIN_ARENA_SIDE || config.height < MIN_ARENA_SIDE {
            return Err(ConfigError::ArenaTooSmall {
                width: config.width,
                height: config.height,
                min: MIN_ARENA_SIDE,
            });
        }
        if config.max_ticks == 0 {
            return Err(ConfigError::ZeroTickLimit);
        }

        let snake_one = Snake::place(Cell::new(2, 2), Direction::Right);
        let snake_two = Snake::place(
            Cell::new(config.width - 3, config.height - 3),
            Direction::Left,
        );
        let snakes = [snake_one, snake_two];

        let food = Self::first_free_from_center(&config, &snakes);

        Ok(Self {
            config,
            tick: 0,
            snakes,
            food,
            rng: Pcg32::seed_from_u64(config.seed),
            outcome: Outcome::Pending,
        })
    }

    /// Current tick counter. Tick 0 is the initial, pre-movement state.
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Terminal outcome, `Pending` while the match runs.
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Full post-resolution state for broadcast.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            tick: self.tick,
            players: [self.snakes[0].to_snapshot(), self.snakes[1].to_snapshot()],
            food: self.food,
            outcome: self.outcome,
        }
    }

    /// Advance the match by one tick.
    ///
    /// `inputs` holds the latest buffered direction per slot, if any; the
    /// engine applies at most this one direction per snake per tick. A
    /// direction that reverses straight into the snake's own neck is ignored
    /// and the previous heading preserved.
    ///
    /// Collision resolution order, evaluated against the post-move board:
    /// wall, self, head-to-head, opponent body, food. A snake whose head
    /// would leave the arena dies without the move being committed, so no
    /// snapshot ever contains an out-of-bounds cell.
    ///
    /// Returns the outcome after this tick. Calling `advance` on a finished
    /// match is a no-op returning the settled outcome.
    pub fn advance(&mut self, inputs: [Option<Direction>; 2]) -> Outcome {
        if self.outcome.is_terminal() {
            return self.outcome;
        }

        // 1. Apply buffered headings, ignoring neck reversals.
        for (snake, input) in self.snakes.iter_mut().zip(inputs) {
            if let Some(dir) = input
                && snake.alive
                && dir != snake.heading.opposite()
            {
                snake.heading = dir;
            }
        }

        // 2. Move. Wall deaths are decided on the tentative head; the move
        //    is only committed for snakes that stay in bounds.
        let mut died = [false, false];
        for (i, snake) in self.snakes.iter_mut().enumerate() {
            if !snake.alive {
                continue;
            }
            let new_head = snake.head().step(snake.heading);
            if !in_bounds(&self.config, new_head) {
                snake.alive = false;
                died[i] = true;
                continue;
            }
            snake.cells.push_front(new_head);
            if snake.pending_growth {
                snake.pending_growth = false;
            } else {
                snake.cells.pop_back();
            }
        }

        // 3a. Self collision: head inside the snake's own body. The vacated
        //     tail cell was already dropped above, so it never counts.
        for (i, snake) in self.snakes.iter_mut().enumerate() {
            if !snake.alive {
                continue;
            }
            let head = snake.head();
            if snake.cells.iter().skip(1).any(|&c| c == head) {
                snake.alive = false;
                died[i] = true;
            }
        }

        // 3b. Head-to-head: both heads entered the same cell this tick.
        if self.snakes[0].alive
            && self.snakes[1].alive
            && self.snakes[0].head() == self.snakes[1].head()
        {
            for (i, snake) in self.snakes.iter_mut().enumerate() {
                snake.alive = false;
                died[i] = true;
            }
        }

        // 3c. Opponent body: head inside any cell of the opposing snake.
        //     A snake that already died this tick still occupies its cells.
        for slot in PlayerSlot::BOTH {
            let i = slot.index();
            let j = slot.other().index();
            if !self.snakes[i].alive {
                continue;
            }
            let head = self.snakes[i].head();
            if self.snakes[j].occupies(head) {
                self.snakes[i].alive = false;
                died[i] = true;
            }
        }

        // 3d. Food: only a surviving head eats. Both heads on the food cell
        //     is impossible here (that is a head-to-head death).
        let mut eaten = false;
        for snake in self.snakes.iter_mut() {
            if snake.alive && snake.head() == self.food {
                snake.score += 1;
                snake.pending_growth = true;
                eaten = true;
            }
        }
        if eaten {
            self.relocate_food();
        }

        self.tick += 1;

        // 4. Terminal conditions.
        self.outcome = match (died[0], died[1]) {
            (true, true) => Outcome::Draw,
            (true, false) => Outcome::Win(PlayerSlot::Two),
            (false, true) => Outcome::Win(PlayerSlot::One),
            (false, false) if self.tick >= self.config.max_ticks => Outcome::Draw,
            (false, false) => Outcome::Pending,
        };

        self.outcome
    }

    // ========================================================================
    // Internal Methods
    // ========================================================================

    /// Move food to a uniformly random cell not occupied by either snake.
    /// If the board is completely covered the food stays put.
    fn relocate_food(&mut self) {
        let free = self.free_cells();
        if free.is_empty() {
            return;
        }
        let idx = self.rng.random_range(0..free.len());
        self.food = free[idx];
    }

    /// All cells not occupied by a snake, in row-major order.
    fn free_cells(&self) -> Vec<Cell> {
        let mut cells = Vec::new();
        for y in 0..self.config.height {
            for x in 0..self.config.width {
                let cell = Cell::new(x, y);
                if !self.snakes.iter().any(|s| s.occupies(cell)) {
                    cells.push(cell);
                }
            }
        }
        cells
    }

    /// Initial food placement: the arena center, or the first unoccupied
    /// cell scanning row-major when the center is covered by a snake.
    fn first_free_from_center(config: &MatchConfig, snakes: &[Snake; 2]) -> Cell {
        let center = Cell::new(config.width / 2, config.height / 2);
        if !snakes.iter().any(|s| s.occupies(center)) {
            return center;
        }
        for y in 0..config.height {
            for x in 0..config.width {
                let cell = Cell::new(x, y);
                if !snakes.iter().any(|s| s.occupies(cell)) {
                    return cell;
                }
            }
        }
        // Unreachable for any arena passing the size validation.
        center
    }

    /// Test-only constructor placing arbitrary snakes and food, for collision
    /// cases that are awkward to reach from the fixed starting layout.
    #[cfg(test)]
    fn with_layout(
        config: MatchConfig,
        layouts: [(Vec<Cell>, Direction); 2],
        food: Cell,
    ) -> Self {
        let [(cells_one, heading_one), (cells_two, heading_two)] = layouts;
        let build = |cells: Vec<Cell>, heading| Snake {
            cells: cells.into_iter().collect(),
            heading,
            alive: true,
            pending_growth: false,
            score: 0,
        };
        Self {
            config,
            tick: 0,
            snakes: [build(cells_one, heading_one), build(cells_two, heading_two)],
            food,
            rng: Pcg32::seed_from_u64(config.seed),
            outcome: Outcome::Pending,
        }
    }
}

fn in_bounds(config: &MatchConfig, cell: Cell) -> bool {
    cell.x >= 0 && cell.x < config.width && cell.y >= 0 && cell.y < config.height
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config_10x10() -> MatchConfig {
        MatchConfig {
            width: 10,
            height: 10,
            max_ticks: 3600,
            seed: 7,
        }
    }

    fn assert_all_in_bounds(game: &Game) {
        let snap = game.snapshot();
        for player in &snap.players {
            for cell in &player.cells {
                assert!(
                    in_bounds(game.config(), *cell),
                    "cell {:?} out of bounds at tick {}",
                    cell,
                    snap.tick
                );
            }
        }
    }

    #[test]
    fn test_starting_positions_are_deterministic() {
        let game = Game::new(config_10x10()).unwrap();
        let snap = game.snapshot();

        assert_eq!(snap.tick, 0);
        assert_eq!(snap.players[0].cells[0], Cell::new(2, 2));
        assert_eq!(snap.players[0].heading, Direction::Right);
        assert_eq!(snap.players[1].cells[0], Cell::new(7, 7));
        assert_eq!(snap.players[1].heading, Direction::Left);
        assert_eq!(snap.food, Cell::new(5, 5));

        // Identical configs build identical matches.
        let again = Game::new(config_10x10()).unwrap();
        assert_eq!(again.snapshot(), snap);
    }

    #[test]
    fn test_bodies_trail_away_from_heading() {
        let game = Game::new(config_10x10()).unwrap();
        let snap = game.snapshot();

        assert_eq!(
            snap.players[0].cells,
            vec![Cell::new(2, 2), Cell::new(1, 2), Cell::new(0, 2)]
        );
        assert_eq!(
            snap.players[1].cells,
            vec![Cell::new(7, 7), Cell::new(8, 7), Cell::new(9, 7)]
        );
    }

    #[test]
    fn test_arena_too_small_refused() {
        let config = MatchConfig {
            width: 5,
            height: 5,
            ..config_10x10()
        };
        assert_eq!(
            Game::new(config).unwrap_err(),
            ConfigError::ArenaTooSmall {
                width: 5,
                height: 5,
                min: 6
            }
        );
    }

    #[test]
    fn test_zero_tick_limit_refused() {
        let config = MatchConfig {
            max_ticks: 0,
            ..config_10x10()
        };
        assert_eq!(Game::new(config).unwrap_err(), ConfigError::ZeroTickLimit);
    }

    /// Right three times puts the first head at (5,2); down three more walks
    /// it onto the food at (5,5), scoring and relocating the food.
    #[test]
    fn test_scenario_path_to_food() {
        let mut game = Game::new(config_10x10()).unwrap();

        for _ in 0..3 {
            game.advance([Some(Direction::Right), None]);
        }
        assert_eq!(game.snapshot().players[0].cells[0], Cell::new(5, 2));

        for _ in 0..3 {
            game.advance([Some(Direction::Down), None]);
        }
        let snap = game.snapshot();
        assert_eq!(snap.players[0].cells[0], Cell::new(5, 5));
        assert_eq!(snap.players[0].score, 1);
        assert_ne!(snap.food, Cell::new(5, 5), "food must relocate after eating");
    }

    #[test]
    fn test_growth_is_deferred_one_tick() {
        let mut game = Game::new(config_10x10()).unwrap();

        // Walk onto the food at (5,5).
        for _ in 0..3 {
            game.advance([Some(Direction::Right), None]);
        }
        for _ in 0..3 {
            game.advance([Some(Direction::Down), None]);
        }
        let len_at_eat = game.snapshot().players[0].cells.len();
        assert_eq!(
            len_at_eat, INITIAL_SNAKE_LEN,
            "length unchanged on the eating tick"
        );

        game.advance([None, None]);
        let snap = game.snapshot();
        assert!(snap.players[0].alive);
        assert_eq!(
            snap.players[0].cells.len(),
            len_at_eat + 1,
            "growth lands one tick after the meal"
        );
    }

    #[test]
    fn test_food_never_spawns_on_occupied_cell() {
        // Several seeds: walk onto the food and verify the relocation avoids
        // every snake cell.
        for seed in 0..8 {
            let mut game = Game::new(MatchConfig {
                seed,
                ..config_10x10()
            })
            .unwrap();
            for _ in 0..3 {
                game.advance([Some(Direction::Right), None]);
            }
            for _ in 0..3 {
                game.advance([Some(Direction::Down), None]);
            }
            let snap = game.snapshot();
            assert_eq!(snap.players[0].score, 1);
            for player in &snap.players {
                assert!(
                    !player.cells.contains(&snap.food),
                    "seed {}: food {:?} spawned on a snake",
                    seed,
                    snap.food
                );
            }
        }
    }

    #[test]
    fn test_wall_collision_kills_without_leaving_bounds() {
        let mut game = Game::new(config_10x10()).unwrap();

        // Snake one turns up from (2,2): two steps reach the top row, the
        // third would leave the arena.
        game.advance([Some(Direction::Up), None]);
        game.advance([None, None]);
        let outcome = game.advance([None, None]);

        assert_eq!(outcome, Outcome::Win(PlayerSlot::Two));
        let snap = game.snapshot();
        assert!(!snap.players[0].alive);
        assert!(snap.players[1].alive);
        assert_all_in_bounds(&game);
    }

    #[test]
    fn test_neck_reversal_is_ignored() {
        let mut game = Game::new(config_10x10()).unwrap();

        // Heading right; a left input must be ignored, not fold the snake.
        let outcome = game.advance([Some(Direction::Left), None]);
        assert_eq!(outcome, Outcome::Pending);
        let snap = game.snapshot();
        assert!(snap.players[0].alive);
        assert_eq!(snap.players[0].cells[0], Cell::new(3, 2));
        assert_eq!(snap.players[0].heading, Direction::Right);
    }

    #[test]
    fn test_self_collision_kills_the_snake() {
        // A length-5 snake coiled in a square: turning left drives the head
        // into its own body. The opponent idles far away.
        let mut game = Game::with_layout(
            config_10x10(),
            [
                (
                    vec![
                        Cell::new(5, 5),
                        Cell::new(5, 6),
                        Cell::new(4, 6),
                        Cell::new(4, 5),
                        Cell::new(3, 5),
                    ],
                    Direction::Up,
                ),
                (
                    vec![Cell::new(7, 2), Cell::new(8, 2), Cell::new(9, 2)],
                    Direction::Left,
                ),
            ],
            Cell::new(0, 0),
        );

        let outcome = game.advance([Some(Direction::Left), None]);
        assert_eq!(outcome, Outcome::Win(PlayerSlot::Two));
        let snap = game.snapshot();
        assert!(!snap.players[0].alive);
        assert!(snap.players[1].alive);
        assert_all_in_bounds(&game);
    }

    #[test]
    fn test_vacated_tail_cell_is_not_a_self_hit() {
        // A length-4 snake looping a 2x2 box re-enters the cell its tail
        // vacates on the same tick. That is legal movement, not a death.
        let mut game = Game::with_layout(
            config_10x10(),
            [
                (
                    vec![
                        Cell::new(5, 5),
                        Cell::new(5, 6),
                        Cell::new(4, 6),
                        Cell::new(4, 5),
                    ],
                    Direction::Up,
                ),
                (
                    vec![Cell::new(7, 2), Cell::new(8, 2), Cell::new(9, 2)],
                    Direction::Left,
                ),
            ],
            Cell::new(0, 0),
        );

        let outcome = game.advance([Some(Direction::Left), None]);
        assert_eq!(outcome, Outcome::Pending);
        assert!(game.snapshot().players[0].alive);
        assert_eq!(game.snapshot().players[0].cells[0], Cell::new(4, 5));
    }

    /// Both heads entering the same cell in the same tick kill both snakes,
    /// yielding a draw.
    #[test]
    fn test_head_to_head_same_cell_is_a_draw() {
        let mut game = Game::new(config_10x10()).unwrap();

        // Snake one keeps heading right along row 2: (3,2)..(7,2).
        // Snake two turns up column 7: (7,6)..(7,2).
        // Both heads enter (7,2) on the fifth tick.
        let mut outcome = game.advance([None, Some(Direction::Up)]);
        for _ in 0..4 {
            outcome = game.advance([None, None]);
        }

        assert_eq!(outcome, Outcome::Draw);
        let snap = game.snapshot();
        assert!(!snap.players[0].alive);
        assert!(!snap.players[1].alive);
        assert_eq!(snap.players[0].cells[0], snap.players[1].cells[0]);
    }

    #[test]
    fn test_opponent_body_collision_single_winner() {
        let mut game = Game::new(config_10x10()).unwrap();

        // Snake two marches left along row 7 untouched. Snake one steps
        // right once, then dives down column 3, arriving at (3,7) on the
        // sixth tick just as two's body covers it.
        game.advance([Some(Direction::Right), None]);
        let mut outcome = Outcome::Pending;
        for _ in 0..5 {
            outcome = game.advance([Some(Direction::Down), None]);
        }

        assert_eq!(outcome, Outcome::Win(PlayerSlot::Two));
        let snap = game.snapshot();
        assert!(!snap.players[0].alive);
        assert!(snap.players[1].alive);
        assert_all_in_bounds(&game);
    }

    #[test]
    fn test_tick_limit_resolves_as_draw() {
        let mut game = Game::new(MatchConfig {
            max_ticks: 4,
            ..config_10x10()
        })
        .unwrap();

        // Both snakes circle in place, never colliding.
        let one = [
            Direction::Down,
            Direction::Right,
            Direction::Up,
            Direction::Left,
        ];
        let two = [
            Direction::Up,
            Direction::Left,
            Direction::Down,
            Direction::Right,
        ];
        let mut outcome = Outcome::Pending;
        for i in 0..4 {
            outcome = game.advance([Some(one[i]), Some(two[i])]);
        }

        assert_eq!(outcome, Outcome::Draw);
        assert_eq!(game.tick(), 4);
        let snap = game.snapshot();
        assert!(snap.players[0].alive, "tick-limit draw leaves both alive");
        assert!(snap.players[1].alive);
    }

    #[test]
    fn test_advance_after_terminal_is_a_noop() {
        let mut game = Game::new(config_10x10()).unwrap();

        // Kill snake one against the top wall.
        game.advance([Some(Direction::Up), None]);
        game.advance([None, None]);
        let outcome = game.advance([None, None]);
        assert!(outcome.is_terminal());

        let snap = game.snapshot();
        let tick = game.tick();
        assert_eq!(
            game.advance([Some(Direction::Down), Some(Direction::Up)]),
            outcome
        );
        assert_eq!(game.tick(), tick);
        assert_eq!(game.snapshot(), snap);
    }

    #[test]
    fn test_no_broadcast_state_leaves_bounds() {
        // Pseudo-random walk for both snakes; every intermediate snapshot
        // must stay in bounds until the match ends.
        let dirs = [
            Direction::Up,
            Direction::Right,
            Direction::Down,
            Direction::Left,
        ];
        let mut game = Game::new(config_10x10()).unwrap();
        let mut x: u64 = 0x9e3779b97f4a7c15;
        for _ in 0..200 {
            x = x
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let a = dirs[(x >> 33) as usize % 4];
            let b = dirs[(x >> 17) as usize % 4];
            let outcome = game.advance([Some(a), Some(b)]);
            assert_all_in_bounds(&game);
            if outcome.is_terminal() {
                break;
            }
        }
    }

    #[test]
    fn test_same_seed_same_food_sequence() {
        let run = |seed: u64| {
            let mut game = Game::new(MatchConfig {
                seed,
                ..config_10x10()
            })
            .unwrap();
            for _ in 0..3 {
                game.advance([Some(Direction::Right), None]);
            }
            for _ in 0..3 {
                game.advance([Some(Direction::Down), None]);
            }
            game.snapshot().food
        };

        assert_eq!(run(42), run(42));
    }
}
