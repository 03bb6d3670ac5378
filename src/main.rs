//! Demo driving the pool manager through a few ticks

use std::cell::RefCell;
use std::rc::Rc;

use pool_manager::factory::Actor;
use pool_manager::prelude::*;

const PROJECTILE: Archetype = Archetype::from_static("Projectile");
const HUD_PANEL: Archetype = Archetype::from_static("HudPanel");
const SPARK: Archetype = Archetype::from_static("Spark");

/// Damage dealt by a projectile
#[derive(Debug, Clone, Copy)]
struct Damage(f32);

/// Short-lived effect built by the generic factory
struct Spark {
    archetype: Archetype,
    frames_left: u32,
}

impl PoolObject for Spark {
    fn archetype(&self) -> &Archetype {
        &self.archetype
    }

    fn callbacks(&mut self) -> Option<&mut dyn PoolObjectCallback> {
        Some(self)
    }
}

impl PoolObjectCallback for Spark {
    fn on_take_from_pool(&mut self, is_new_spawned: bool, placement: &Transform) {
        self.frames_left = 12;
        log::info!(
            "Spark at {} ({})",
            placement.position,
            if is_new_spawned { "new" } else { "reused" }
        );
    }

    fn on_return_to_pool(&mut self) {
        log::debug!("Spark returned with {} frames left", self.frames_left);
    }
}

fn archetypes() -> Archetypes {
    let mut archetypes = Archetypes::new();
    archetypes.declare(PROJECTILE, Archetype::ACTOR);
    archetypes.declare(HUD_PANEL, Archetype::WIDGET);
    archetypes.declare_with(SPARK, Archetype::OBJECT, |archetype| {
        ObjectRef::new(Spark {
            archetype: archetype.clone(),
            frames_left: 0,
        })
    });
    archetypes
}

fn catalog(world: &Rc<RefCell<World>>, viewport: &Rc<RefCell<Viewport>>) -> FactoryCatalog {
    let mut catalog = FactoryCatalog::new();

    let world = world.clone();
    catalog.register("actor", move || {
        Box::new(
            ActorFactory::new(world.clone()).with_prefab(PROJECTILE, |builder| {
                builder.add(Damage(25.0));
            }),
        )
    });

    let viewport = viewport.clone();
    catalog.register("widget", move || {
        Box::new(
            WidgetFactory::new(viewport.clone()).with_layout(HUD_PANEL, |archetype| {
                Panel::new(archetype.clone())
                    .with_rect(Rect::new(0.0, 16.0, 320.0, 48.0).with_anchor(Anchor::TopCenter))
                    .with_child(Panel::new(Archetype::WIDGET))
            }),
        )
    });

    catalog
}

fn run() -> Result<(), PoolError> {
    let world = Rc::new(RefCell::new(World::new()));
    let viewport = Rc::new(RefCell::new(Viewport::new()));

    let settings = PoolSettings::default()
        .with_objects_per_tick(2)
        .with_factory(Archetype::ACTOR, "actor")
        .with_factory(Archetype::WIDGET, "widget");
    let mut registry =
        PoolRegistry::from_settings(settings, archetypes(), &catalog(&world, &viewport));

    let volley = registry.acquire_many(&PROJECTILE, SpawnPriority::Normal, 5, |_, records| {
        log::info!("Volley of {} projectiles ready", records.len());
    })?;
    let hud = registry.acquire(
        &HUD_PANEL,
        SpawnPriority::High,
        Transform::default(),
        |_, record| log::info!("HUD panel {} ready", record.handle),
    )?;
    let spark = registry.acquire(
        &SPARK,
        SpawnPriority::Critical,
        Transform::from_position(Vec3::new(0.0, 1.0, -4.0)),
        |_, _| {},
    )?;

    while registry.pending_count() > 0 {
        let spawned = registry.tick()?;
        log::info!(
            "Tick {}: spawned {spawned}, {} pending",
            registry.current_tick(),
            registry.pending_count()
        );
    }

    let volley_damage: f32 = volley
        .iter()
        .filter_map(|handle| registry.find_by_handle(handle))
        .filter_map(|record| record.object.downcast_ref::<Actor>().map(|actor| actor.entity()))
        .filter_map(|entity| world.borrow().get::<Damage>(entity).ok().map(|damage| damage.0))
        .sum();
    log::info!("Volley deals {volley_damage} damage");

    if !registry.release_handles(&volley) {
        log::warn!("Some projectiles could not be released");
    }
    registry.release_handle(&spark)?;
    registry.release_handle(&hud)?;

    // Served from the free objects, no construction needed
    registry.acquire_many(&PROJECTILE, SpawnPriority::Normal, 3, |_, records| {
        log::info!("Reused {} projectiles", records.len());
    })?;
    registry.acquire(
        &SPARK,
        SpawnPriority::Normal,
        Transform::from_position(Vec3::new(2.0, 1.0, -4.0)),
        |_, _| {},
    )?;

    log::info!(
        "{} actors in the world, {} panels attached, {} free projectiles",
        world.borrow().len(),
        viewport.borrow().len(),
        registry.free_count(&PROJECTILE)
    );

    let destroyed = registry.empty_all()?;
    log::info!("Destroyed {destroyed} pooled objects");
    log::info!("{}", registry.stats().format_stats());
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("Pool demo failed: {e}");
        std::process::exit(1);
    }
}
