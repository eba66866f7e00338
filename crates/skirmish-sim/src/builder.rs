use crate::{Battle, ScenarioSpec, SimError, UnitSpec};

#[derive(Debug, Clone)]
/// Struct to build scenarios in code
pub struct ScenarioBuilder {
    width: i32,
    height: i32,
    time_limit: u64,
    seed: u64,
    units: Vec<UnitSpec>,
}

impl ScenarioBuilder {
    /// Create a builder for a `width` x `height` map with a 1000 tick limit
    pub fn new(width: i32, height: i32) -> Self {
        ScenarioBuilder {
            width,
            height,
            time_limit: 1000,
            seed: 0,
            units: Vec::new(),
        }
    }

    pub fn set_time_limit(&mut self, time_limit: u64) -> &mut Self {
        self.time_limit = time_limit;
        self
    }

    /// Seed for damage rolls
    pub fn set_seed(&mut self, seed: u64) -> &mut Self {
        self.seed = seed;
        self
    }

    /// Add a melee unit with unit durations
    pub fn add_unit(
        &mut self,
        id: u64,
        player: u8,
        (x, y): (i32, i32),
        hp: i32,
        (min_damage, max_damage): (i32, i32),
    ) -> &mut Self {
        self.units.push(UnitSpec {
            id,
            player,
            x,
            y,
            hp,
            max_hp: None,
            min_damage,
            max_damage,
            attack_range: 1,
            attack_time: 1,
            move_time: 1,
        });
        self
    }

    /// Change the attack range of an added unit
    pub fn set_range(&mut self, id: u64, attack_range: i32) -> Result<&mut Self, SimError> {
        self.unit_mut(id)?.attack_range = attack_range;
        Ok(self)
    }

    /// Change how long attacks and moves of an added unit take
    pub fn set_durations(
        &mut self,
        id: u64,
        attack_time: u64,
        move_time: u64,
    ) -> Result<&mut Self, SimError> {
        let unit = self.unit_mut(id)?;
        unit.attack_time = attack_time;
        unit.move_time = move_time;
        Ok(self)
    }

    fn unit_mut(&mut self, id: u64) -> Result<&mut UnitSpec, SimError> {
        self.units
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(SimError::BuilderUnknownUnit { id })
    }

    pub fn build_spec(&self) -> Result<ScenarioSpec, SimError> {
        let spec = ScenarioSpec {
            version: Some(1),
            width: self.width,
            height: self.height,
            time_limit: self.time_limit,
            seed: self.seed,
            units: self.units.clone(),
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn build(&self) -> Result<Battle, SimError> {
        self.build_spec()?.build()
    }
}
