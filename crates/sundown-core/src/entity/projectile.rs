//! Projectiles fired by shooter mobs and by the player.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::animation::AnimationState;
use crate::config::ProjectileConfig;
use crate::context::TickContext;
use crate::entity::EntityId;
use crate::geometry::{Body, ColliderShape, Rect, Sides};
use crate::output::{Modifier, Output};
use crate::render::SpriteDraw;

/// Side a projectile belongs to. Projectiles only damage the other side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// Fired by the player; damages mobs.
    Player,
    /// Fired by a mob; damages the player.
    Mob,
}

/// A projectile travelling horizontally at constant speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    owner: Option<EntityId>,
    faction: Faction,
    dir: i32,
    speed: i32,
    damage: i32,
    body: Body,
    animation: AnimationState,
    alive: bool,
}

impl Projectile {
    /// Creates a projectile centered on `origin`.
    #[must_use]
    pub fn new(
        owner: Option<EntityId>,
        faction: Faction,
        origin: IVec2,
        dir: i32,
        config: &ProjectileConfig,
        now: u64,
        frame_interval: u64,
    ) -> Self {
        let mut animation =
            AnimationState::new(config.sheet.sprite, config.sheet.grid, frame_interval)
                .with_loop(config.frames);
        animation.anchor(now);
        let size = config.size;
        Self {
            owner,
            faction,
            dir: if dir < 0 { -1 } else { 1 },
            speed: config.speed,
            damage: config.damage,
            body: Body::new(origin - size / 2, size, 1.0)
                .with_collider(ColliderShape::Footprint(Rect::new(0, 0, size.x, size.y))),
            animation,
            alive: true,
        }
    }

    /// Moves one step. The projectile is spent when its leading side is
    /// blocked, when it leaves the map, or when a mob shot hits the player.
    /// Player shots are matched against mobs by the arena.
    pub fn update(&mut self, ctx: &TickContext<'_>, out: &mut Vec<Output>) {
        if !self.alive {
            return;
        }
        let sides = ctx.map.passable_sides(&self.body.collider());
        if !sides.contains(Sides::leading_horizontal(self.dir)) {
            self.spend();
            return;
        }
        self.body.translate(self.dir * self.speed, 0);
        if !ctx.map_bounds().intersects(&self.body.bounds()) {
            self.spend();
            return;
        }
        if self.faction == Faction::Mob
            && ctx.player.alive
            && self.body.collider().intersects(&ctx.player.collider)
        {
            out.push(
                Modifier::DamagePlayer {
                    amount: self.damage,
                    source: self.owner,
                }
                .into(),
            );
            self.spend();
            return;
        }
        self.animation.advance(ctx.now);
    }

    /// Marks the projectile spent and hides it.
    pub fn spend(&mut self) {
        self.alive = false;
        self.body.set_visible(false);
    }

    /// Draw request, or `None` once spent.
    #[must_use]
    pub fn sprite(&self) -> Option<SpriteDraw> {
        SpriteDraw::of(&self.body, &self.animation, self.dir < 0)
    }

    /// Firing mob, or `None` for the player.
    #[must_use]
    pub const fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    /// Side the projectile belongs to.
    #[must_use]
    pub const fn faction(&self) -> Faction {
        self.faction
    }

    /// Damage on impact.
    #[must_use]
    pub const fn damage(&self) -> i32 {
        self.damage
    }

    /// Horizontal direction: -1 left, 1 right.
    #[must_use]
    pub const fn dir(&self) -> i32 {
        self.dir
    }

    /// Spatial state.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// False once spent.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Difficulty, SimConfig};
    use crate::context::{PlayerView, SpeedWindows};
    use crate::map::{OpenField, Passability};

    fn ctx<'a>(
        config: &'a SimConfig,
        map: &'a dyn Passability,
        player: PlayerView,
    ) -> TickContext<'a> {
        TickContext {
            now: 10,
            difficulty: Difficulty::Medium,
            windows: SpeedWindows::default(),
            player,
            map,
            config,
        }
    }

    fn shot(faction: Faction, origin: IVec2, dir: i32) -> Projectile {
        let config = ProjectileConfig::default();
        Projectile::new(Some(EntityId::new(3)), faction, origin, dir, &config, 0, 100)
    }

    #[test]
    fn travels_in_firing_direction() {
        let config = SimConfig::default();
        let mut projectile = shot(Faction::Mob, IVec2::new(300, 300), -1);
        let start = projectile.body().position();
        projectile.update(&ctx(&config, &OpenField, PlayerView::default()), &mut Vec::new());
        assert_eq!(projectile.body().position(), start - IVec2::new(config.projectile.speed, 0));
        assert!(projectile.is_alive());
    }

    #[test]
    fn blocked_side_spends_projectile() {
        let config = SimConfig::default();
        let wall = |_: &Rect| Sides::LEFT;
        let mut projectile = shot(Faction::Mob, IVec2::new(300, 300), 1);
        projectile.update(&ctx(&config, &wall, PlayerView::default()), &mut Vec::new());
        assert!(!projectile.is_alive());
        assert!(projectile.sprite().is_none());
    }

    #[test]
    fn leaving_the_map_spends_projectile() {
        let config = SimConfig::default();
        let mut projectile = shot(Faction::Player, IVec2::new(-2, 300), -1);
        projectile.update(&ctx(&config, &OpenField, PlayerView::default()), &mut Vec::new());
        assert!(!projectile.is_alive());
    }

    #[test]
    fn mob_shot_damages_player_once() {
        let config = SimConfig::default();
        let player = PlayerView {
            alive: true,
            collider: Rect::new(290, 280, 40, 40),
            position: IVec2::new(290, 280),
        };
        let mut projectile = shot(Faction::Mob, IVec2::new(300, 300), 1);
        let mut out = Vec::new();
        projectile.update(&ctx(&config, &OpenField, player), &mut out);
        projectile.update(&ctx(&config, &OpenField, player), &mut out);

        assert_eq!(
            out,
            vec![Output::Modifier(Modifier::DamagePlayer {
                amount: config.projectile.damage,
                source: Some(EntityId::new(3)),
            })]
        );
        assert!(!projectile.is_alive());
    }

    #[test]
    fn player_shot_ignores_player() {
        let config = SimConfig::default();
        let player = PlayerView {
            alive: true,
            collider: Rect::new(290, 280, 40, 40),
            position: IVec2::new(290, 280),
        };
        let mut projectile = shot(Faction::Player, IVec2::new(300, 300), 1);
        let mut out = Vec::new();
        projectile.update(&ctx(&config, &OpenField, player), &mut out);
        assert!(out.is_empty());
        assert!(projectile.is_alive());
    }
}
