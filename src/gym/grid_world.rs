use std::fmt;

use rand::Rng;
use strum::{Display, EnumIter, FromRepr, VariantArray};

use crate::{
    env::{DiscreteActionSpace, Environment, Step},
    Error, Result,
};

/// Side length of the square grid
pub const GRID_SIZE: usize = 4;
/// Number of layers per cell, one per [`Layer`]
pub const LAYER_COUNT: usize = 4;
/// Length of the flattened state encoding
pub const STATE_LEN: usize = GRID_SIZE * GRID_SIZE * LAYER_COUNT;
/// Number of actions, one per [`GridAction`]
pub const NUM_ACTIONS: usize = 4;

/// Reward for stepping into the pit
pub const PIT_REWARD: f32 = -10.0;
/// Reward for reaching the goal
pub const GOAL_REWARD: f32 = 10.0;
/// Living cost paid on every other step
pub const STEP_REWARD: f32 = -1.0;

const MAX_PLACEMENT_ATTEMPTS: usize = 10_000;

const STANDARD_WALL: Location = Location::new(2, 2);
const STANDARD_PIT: Location = Location::new(1, 1);
const STANDARD_GOAL: Location = Location::new(3, 3);
const STANDARD_PLAYER: Location = Location::new(0, 1);

/// The flattened grid handed to a [`QFunction`](crate::algo::QFunction)
pub type Encoding = [f32; STATE_LEN];

/// The marker layers of a cell
#[derive(EnumIter, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    Wall = 0,
    Pit = 1,
    Goal = 2,
    Player = 3,
}

/// A coordinate pair on the grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    x: usize,
    y: usize,
}

impl Location {
    /// Both coordinates are expected to lie in `[0, GRID_SIZE)`
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::new(rng.gen_range(0..GRID_SIZE), rng.gen_range(0..GRID_SIZE))
    }

    pub fn x(&self) -> usize {
        self.x
    }

    pub fn y(&self) -> usize {
        self.y
    }

    /// The adjacent location in the direction of `action`, or `None` if it would leave the grid
    pub fn neighbor(self, action: GridAction) -> Option<Self> {
        let (dx, dy) = action.delta();
        let x = self.x.checked_add_signed(dx).filter(|&x| x < GRID_SIZE)?;
        let y = self.y.checked_add_signed(dy).filter(|&y| y < GRID_SIZE)?;
        Some(Self::new(x, y))
    }
}

/// Actions for the [`GridWorld`] environment
#[derive(FromRepr, EnumIter, VariantArray, Display, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[strum(serialize_all = "UPPERCASE")]
pub enum GridAction {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl GridAction {
    /// `(dx, dy)` with `y` growing downwards
    pub fn delta(self) -> (isize, isize) {
        match self {
            GridAction::Up => (0, -1),
            GridAction::Down => (0, 1),
            GridAction::Left => (-1, 0),
            GridAction::Right => (1, 0),
        }
    }
}

impl TryFrom<usize> for GridAction {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self> {
        Self::from_repr(value).ok_or_else(|| {
            Error::InvariantViolation(format!(
                "action index {value} outside [0, {NUM_ACTIONS})"
            ))
        })
    }
}

impl From<GridAction> for usize {
    fn from(action: GridAction) -> Self {
        action as usize
    }
}

/// How a fresh episode lays out the grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layout {
    /// Fixed wall, pit, goal and player start
    #[default]
    Standard,
    /// Fixed wall, pit and goal with the player on a random free cell
    RandomPlayer,
    /// Wall, pit, goal and player all on distinct random cells
    Random,
}

/// A small square grid with a wall, a pit and a goal
///
/// The player pays [`STEP_REWARD`] per move and the episode ends in the pit ([`PIT_REWARD`])
/// or on the goal ([`GOAL_REWARD`]). Moves off the grid or into the wall leave the player in place.
#[derive(Debug, Clone, PartialEq)]
pub struct GridWorld {
    cells: [[[u8; LAYER_COUNT]; GRID_SIZE]; GRID_SIZE],
    player: Location,
    layout: Layout,
}

impl Default for GridWorld {
    fn default() -> Self {
        Self::standard()
    }
}

impl GridWorld {
    fn empty(layout: Layout, player: Location) -> Self {
        let mut world = Self {
            cells: [[[0; LAYER_COUNT]; GRID_SIZE]; GRID_SIZE],
            player,
            layout,
        };
        world.mark(player, Layer::Player);
        world
    }

    fn with_fixed_features(layout: Layout, player: Location) -> Self {
        let mut world = Self::empty(layout, player);
        world.mark(STANDARD_WALL, Layer::Wall);
        world.mark(STANDARD_PIT, Layer::Pit);
        world.mark(STANDARD_GOAL, Layer::Goal);
        world
    }

    /// Wall at `(2,2)`, pit at `(1,1)`, goal at `(3,3)`, player at `(0,1)`
    pub fn standard() -> Self {
        Self::with_fixed_features(Layout::Standard, STANDARD_PLAYER)
    }

    /// The standard wall, pit and goal with the player on a uniformly random free cell
    pub fn random_player<R: Rng + ?Sized>(rng: &mut R) -> Result<Self> {
        let fixed = [STANDARD_WALL, STANDARD_PIT, STANDARD_GOAL];
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let player = Location::random(rng);
            if !fixed.contains(&player) {
                return Ok(Self::with_fixed_features(Layout::RandomPlayer, player));
            }
        }
        Err(placement_exhausted())
    }

    /// Wall, pit, goal and player each on a uniformly random cell, all distinct
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Result<Self> {
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let [wall, pit, goal, player] = std::array::from_fn(|_| Location::random(rng));
            let distinct = wall != pit
                && wall != goal
                && wall != player
                && pit != goal
                && pit != player
                && goal != player;
            if distinct {
                let mut world = Self::empty(Layout::Random, player);
                world.mark(wall, Layer::Wall);
                world.mark(pit, Layer::Pit);
                world.mark(goal, Layer::Goal);
                return Ok(world);
            }
        }
        Err(placement_exhausted())
    }

    /// Build a fresh grid for `layout`
    pub fn with_layout<R: Rng + ?Sized>(layout: Layout, rng: &mut R) -> Result<Self> {
        match layout {
            Layout::Standard => Ok(Self::standard()),
            Layout::RandomPlayer => Self::random_player(rng),
            Layout::Random => Self::random(rng),
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn player(&self) -> Location {
        self.player
    }

    /// Whether the cell at `loc` carries the `layer` marker
    pub fn has(&self, loc: Location, layer: Layer) -> bool {
        self.cells[loc.x][loc.y][layer as usize] == 1
    }

    fn mark(&mut self, loc: Location, layer: Layer) {
        self.cells[loc.x][loc.y][layer as usize] = 1;
    }

    fn clear(&mut self, loc: Location, layer: Layer) {
        self.cells[loc.x][loc.y][layer as usize] = 0;
    }

    /// Move the player one cell in the direction of `action`
    ///
    /// **Returns** whether the player moved; moves off the grid or into the wall are no-ops
    pub fn move_player(&mut self, action: GridAction) -> bool {
        match self.player.neighbor(action) {
            Some(to) if !self.has(to, Layer::Wall) => {
                self.clear(self.player, Layer::Player);
                self.player = to;
                self.mark(to, Layer::Player);
                true
            }
            _ => false,
        }
    }

    /// Reward for the player's current cell
    pub fn reward(&self) -> f32 {
        if self.has(self.player, Layer::Pit) {
            PIT_REWARD
        } else if self.has(self.player, Layer::Goal) {
            GOAL_REWARD
        } else {
            STEP_REWARD
        }
    }

    /// The player is in the pit or on the goal
    pub fn is_terminal(&self) -> bool {
        self.reward() != STEP_REWARD
    }

    /// Flatten the layers with `x` outermost, then `y`, then layer
    pub fn encode(&self) -> Encoding {
        let mut out = [0.0; STATE_LEN];
        let flat = self.cells.iter().flatten().flatten();
        for (o, &v) in out.iter_mut().zip(flat) {
            *o = f32::from(v);
        }
        out
    }

    /// Verify that exactly one cell carries the player marker and that it matches the tracked location
    pub fn check_invariants(&self) -> Result<()> {
        let players = self
            .cells
            .iter()
            .flatten()
            .filter(|cell| cell[Layer::Player as usize] == 1)
            .count();
        if players != 1 {
            return Err(Error::InvariantViolation(format!(
                "expected exactly one player marker, found {players}"
            )));
        }
        if !self.has(self.player, Layer::Player) {
            return Err(Error::InvariantViolation(format!(
                "player marker is not at {:?}",
                self.player
            )));
        }
        Ok(())
    }
}

fn placement_exhausted() -> Error {
    Error::InvalidRequest(format!(
        "no valid placement found in {MAX_PLACEMENT_ATTEMPTS} attempts"
    ))
}

impl fmt::Display for GridWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let border = " ---".repeat(GRID_SIZE) + " ";
        writeln!(f, "{border}")?;
        for y in 0..GRID_SIZE {
            for x in 0..GRID_SIZE {
                let loc = Location::new(x, y);
                let marker = if loc == self.player {
                    " O "
                } else if self.has(loc, Layer::Wall) {
                    "---"
                } else if self.has(loc, Layer::Pit) {
                    " ! "
                } else if self.has(loc, Layer::Goal) {
                    " $ "
                } else {
                    " . "
                };
                write!(f, " {marker}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "{border}")
    }
}

impl Environment for GridWorld {
    type State = Encoding;
    type Action = GridAction;

    fn step(&mut self, action: Self::Action) -> Result<Step<Self::State>> {
        self.move_player(action);
        self.check_invariants()?;

        Ok(Step {
            next_state: self.encode(),
            reward: self.reward(),
            terminal: self.is_terminal(),
        })
    }

    fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Self::State> {
        *self = Self::with_layout(self.layout, rng)?;
        Ok(self.encode())
    }
}

impl DiscreteActionSpace for GridWorld {
    fn actions(&self) -> Vec<Self::Action> {
        GridAction::VARIANTS.to_vec()
    }
}
