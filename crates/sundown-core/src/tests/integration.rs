//! End-to-end tests of the full step pipeline.

use glam::IVec2;

use super::helpers::*;
use crate::config::{MobKind, SimConfig};
use crate::context::WindowKind;
use crate::entity::{Entity, PlayerInput, PowerupKind};
use crate::map::TileMap;
use crate::output::{Command, Event, Modifier, OutputSource};
use crate::render::SpriteDraw;

// =============================================================================
// Projectiles
// =============================================================================

mod projectile_tests {
    use super::*;

    #[test]
    fn player_shot_damages_mob_on_its_row() {
        let mut sim = open_sim();
        let row = sim.player().body().bounds().center().y;
        let target = spawn_mob_centered_on_row(&mut sim, MobKind::Coyote, 300, row, walker(10, 0));
        sim.step(0);

        assert!(sim.player_fire());
        let mut now = 0;
        for _ in 0..60 {
            now += FRAME;
            sim.step(now);
            if sim.mob(target).is_some_and(|m| m.health() < 10) {
                break;
            }
        }

        let damage = SimConfig::default().projectile.damage;
        assert_eq!(sim.mob(target).map(|m| m.health()), Some(10 - damage));
        let log = events(&sim.take_events());
        assert!(log.iter().any(|e| matches!(e, Event::ProjectileFired { owner: None, .. })));
        assert!(log.iter().any(|e| matches!(
            e,
            Event::DamageIndicator { target: t, amount, .. } if *t == target && *amount == damage
        )));
        assert!(sim.arena().entities_sorted().all(|e| e.as_projectile().is_none()));
    }

    #[test]
    fn mob_shot_damages_player() {
        let mut sim = open_sim();
        let row = sim.player().body().collider().center().y;
        let id = sim.spawn_mob_with(MobKind::Cowboy, IVec2::new(400, row), gunner(20, FRAME));
        if let Some(mob) = sim.arena_mut().get_mut(id).and_then(Entity::as_mob_mut) {
            *mob = mob.clone().facing(-1);
            let offset = row - mob.body().bounds().center().y;
            mob.body_mut().translate(0, offset);
        }

        let mut now = 0;
        sim.step(now);
        for _ in 0..80 {
            now += FRAME;
            sim.step(now);
            if sim.player().strength() < 100 {
                break;
            }
        }

        assert_eq!(
            sim.player().strength(),
            100 - SimConfig::default().projectile.damage
        );
    }

    #[test]
    fn dead_player_cannot_fire() {
        let mut sim = open_sim();
        sim.submit(Modifier::DamagePlayer {
            amount: 1_000,
            source: None,
        });
        sim.step(0);
        assert!(!sim.player_fire());
    }
}

// =============================================================================
// Powerups
// =============================================================================

mod powerup_tests {
    use super::*;

    #[test]
    fn invalid_powerup_id_is_ignored() {
        let mut sim = open_sim();
        assert!(sim.spawn_powerup_by_id(9, IVec2::new(10, 10)).is_none());
        assert!(sim.arena().is_empty());
        assert!(sim.spawn_powerup_by_id(PowerupKind::Shield.id(), IVec2::new(10, 10)).is_some());
    }

    #[test]
    fn shield_blocks_damage_until_it_ends() {
        let mut sim = open_sim();
        let duration = sim.config().powerup.shield_duration;
        sim.submit(Command::ActivatePowerup {
            kind: PowerupKind::Shield,
        });
        sim.step(0);
        assert!(sim.player().is_invulnerable());

        sim.submit(Modifier::DamagePlayer {
            amount: 30,
            source: None,
        });
        sim.step(1);
        assert_eq!(sim.player().strength(), 100);

        sim.step(1 + duration);
        assert!(!sim.player().is_invulnerable());
        assert!(events(&sim.take_events()).contains(&Event::ShieldEnded));

        sim.submit(Modifier::DamagePlayer {
            amount: 30,
            source: None,
        });
        sim.step(2 + duration);
        assert_eq!(sim.player().strength(), 70);
    }

    #[test]
    fn repeat_pickup_extends_the_window() {
        let mut sim = open_sim();
        let duration = sim.config().powerup.window_duration;
        let freeze = Command::ActivatePowerup {
            kind: PowerupKind::Freeze,
        };

        sim.submit(freeze.clone());
        sim.step(0);
        sim.step(1);
        let half = duration / 2;
        sim.submit(freeze);
        sim.step(half);
        sim.step(half + 1);

        sim.step(1 + duration);
        assert!(sim.windows().zero_speed, "first timer must be replaced");

        sim.step(half + 1 + duration);
        assert!(!sim.windows().zero_speed);
        let log = events(&sim.take_events());
        assert_eq!(
            log.iter()
                .filter(|e| **e == Event::WindowEnded { window: WindowKind::ZeroSpeed })
                .count(),
            1
        );
        assert_eq!(sim.world().window_timer(WindowKind::ZeroSpeed), None);
    }

    #[test]
    fn heal_is_capped_by_difficulty() {
        let mut sim = open_sim();
        sim.set_difficulty(crate::config::Difficulty::Hard);
        let cap = sim.config().difficulty.heal_cap.get(crate::config::Difficulty::Hard);
        sim.submit(Modifier::DamagePlayer {
            amount: 90,
            source: None,
        });
        sim.step(0);
        sim.submit(Command::ActivatePowerup {
            kind: PowerupKind::Heal,
        });
        sim.step(1);
        sim.submit(Command::ActivatePowerup {
            kind: PowerupKind::Heal,
        });
        sim.step(2);
        sim.submit(Command::ActivatePowerup {
            kind: PowerupKind::Heal,
        });
        sim.step(3);
        assert_eq!(sim.player().strength(), cap);
    }
}

// =============================================================================
// Mobs
// =============================================================================

mod mob_tests {
    use super::*;

    #[test]
    fn removed_shooter_loses_its_timer() {
        let mut sim = open_sim();
        let id = sim.spawn_mob_with(MobKind::Cowboy, IVec2::new(800, 60), gunner(5, 10 * FRAME));
        let timer = sim.mob(id).and_then(|m| m.shoot_timer()).unwrap();
        sim.step(0);
        assert!(sim.scheduler().contains(timer));

        sim.submit(Modifier::DamageMob { target: id, amount: 5 });
        let mut now = 0;
        while sim.mob(id).is_some() && now < 100 * FRAME {
            now += FRAME;
            sim.step(now);
        }
        assert!(sim.mob(id).is_none());
        sim.step(now + 1);
        assert!(!sim.scheduler().contains(timer));
    }

    #[test]
    fn cactus_dies_on_contact() {
        let mut sim = open_sim();
        let collider = sim.player().body().collider();
        let id = spawn_mob_centered_on_row(
            &mut sim,
            MobKind::Cactus,
            collider.x,
            collider.center().y,
            walker(2, 0),
        );
        sim.step(0);

        let log = sim.take_events();
        assert!(sim.player().strength() < 100);
        assert_eq!(sim.mob(id).map(|m| m.is_dying()), Some(true));
        let died = log
            .iter()
            .find(|e| matches!(e.output().as_event(), Some(Event::MobDied { .. })))
            .unwrap();
        assert_eq!(died.source(), OutputSource::Entity(id));
    }

    #[test]
    fn spawn_rolls_stay_in_profile_bounds() {
        let mut sim = open_sim();
        let profile = sim.config().profile(MobKind::Cowboy).into_owned();
        for i in 0..20 {
            let id = sim.spawn_mob(MobKind::Cowboy, IVec2::new(i * 10, 0));
            let mob = sim.mob(id).unwrap();
            assert!((profile.health.min..=profile.health.max).contains(&mob.health()));
            assert!((profile.speed.min..=profile.speed.max).contains(&mob.base_speed()));
            assert_eq!(mob.is_shooter(), mob.shoot_timer().is_some());
        }
    }
}

// =============================================================================
// Player and drawing
// =============================================================================

mod player_tests {
    use super::*;

    #[test]
    fn walls_block_player_movement() {
        let map = TileMap::from_rows(
            32,
            &["........", "........", "........", "........", "########", "........"],
        );
        let mut sim = sim_on(map);
        let speed = sim.config().player.speed;
        sim.player_mut().body_mut().set_position(IVec2::new(0, 0));
        sim.set_player_input(PlayerInput::new(0, 1));

        let mut now = 0;
        for _ in 0..40 {
            sim.step(now);
            now += FRAME;
        }
        let settled = sim.player().body().position();
        sim.step(now);

        let collider = sim.player().body().collider();
        assert_eq!(sim.player().body().position(), settled);
        assert!((128..128 + speed).contains(&collider.bottom()), "{collider:?}");
    }

    #[test]
    fn draw_emits_visible_sprites_then_player() {
        let mut sim = open_sim();
        sim.spawn_mob_with(MobKind::Coyote, IVec2::new(600, 100), walker(5, 0));
        let consumed = sim.spawn_powerup(PowerupKind::Slow, IVec2::new(900, 100));
        sim.spawn_powerup(PowerupKind::Heal, IVec2::new(1000, 100));
        sim.step(0);
        if let Some(powerup) = sim
            .arena_mut()
            .get_mut(consumed)
            .and_then(Entity::as_powerup_mut)
        {
            powerup.consume(crate::output::ConsumeReason::Pickup);
        }

        let mut frame: Vec<SpriteDraw> = Vec::new();
        sim.draw(&mut frame);

        assert_eq!(frame.len(), 3);
        let player = sim.player().sprite().unwrap();
        assert_eq!(frame.last(), Some(&player));
        assert_eq!(frame[0].image, sim.config().profile(MobKind::Coyote).sheet.sprite);
    }
}
