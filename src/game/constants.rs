/// Timing constants for the client loops
pub mod timing {
    /// Render cadence (display refresh) in Hz
    pub const FRAME_RATE_HZ: u32 = 60;
    /// Interval of the held-direction command loop in milliseconds
    pub const DIRECTION_INTERVAL_MS: u64 = 10;
    /// Delay before returning to the menu after the local tank died
    pub const RETURN_AFTER_DEATH_MS: u64 = 2_500;
    /// Delay before returning to the menu after the room closed
    pub const RETURN_AFTER_ROOM_CLOSE_MS: u64 = 7_500;
    /// Delay before returning to the menu after a kick or a lost connection
    pub const RETURN_AFTER_DISCONNECT_MS: u64 = 5_000;
    /// Stats log period in seconds
    pub const STATS_LOG_INTERVAL_SECS: u64 = 30;
}

/// Input constants
pub mod input {
    /// Magnitude of the keyboard-driven target vector on each axis
    pub const DIRECTIONAL_TARGET_MAGNITUDE: f32 = f32::MAX;
    /// Maximum number of logical directions that can be held at once
    pub const MAX_HELD_DIRECTIONS: usize = 6;

    /// Key codes (DOM `keyCode` values)
    pub mod keys {
        pub const TAB: u32 = 9;
        pub const ENTER: u32 = 13;
        pub const SPACE: u32 = 32;
        pub const LEFT: u32 = 37;
        pub const UP: u32 = 38;
        pub const RIGHT: u32 = 39;
        pub const DOWN: u32 = 40;
        pub const A: u32 = 65;
        pub const D: u32 = 68;
    }
}

/// Rendering constants
pub mod render {
    /// Status screen background
    pub const STATUS_BACKGROUND: &str = "#333333";
    /// Status screen text colour
    pub const STATUS_TEXT: &str = "#FFFFFF";
    /// Status screen font
    pub const STATUS_FONT: &str = "bold 30px sans-serif";

    /// Planet outline colour
    pub const PLANET_STROKE: &str = "grey";
    /// Planet outline width
    pub const PLANET_LINE_WIDTH: f32 = 10.0;
    /// Reference planet radius (km) the gradient stops are expressed against
    pub const PLANET_REFERENCE_RADIUS: f32 = 6370.0;
    /// Molten-core palette: (depth below surface in km, colour), surface last
    pub const PLANET_LAYERS: [(f32, &str); 6] = [
        (5000.0, "#E2D61D"), // inner core
        (4000.0, "#E2A91D"), // upper core
        (2500.0, "#F59623"), // lower mantle
        (1000.0, "#C23A0A"), // upper mantle
        (35.0, "grey"),      // crust
        (0.0, "grey"),
    ];
    /// Colour at the very centre of the gradient
    pub const PLANET_CENTER_COLOR: &str = "yellow";

    /// Treads sit this fraction of their height back along the planet radial
    pub const TREAD_OFFSET_FRACTION: f32 = 0.3;

    /// Explosions are outlined with a polygon of this many sides
    pub const EXPLOSION_SIDES: usize = 16;

    /// Trajectory dash pattern and width
    pub const TRAJECTORY_DASH: [f32; 2] = [5.0, 15.0];
    pub const TRAJECTORY_LINE_WIDTH: f32 = 5.0;
    /// Fallback colour for trajectories and particles without a hue
    pub const DEFAULT_TINT: &str = "red";

    /// Border line colour and width
    pub const BORDER_COLOR: &str = "#000000";
    pub const BORDER_LINE_WIDTH: f32 = 1.0;
}

/// Trail particle constants
pub mod particles {
    /// Bullets spawn a trail particle while `now % PERIOD < DUTY`
    pub const SPAWN_PERIOD_MS: u64 = 100;
    pub const SPAWN_DUTY_MS: u64 = 50;
    /// Lifetime of a trail particle
    pub const TRAIL_TTL_MS: u64 = 10_000;
    /// Trail particle sprite and scale
    pub const TRAIL_SPRITE: &str = "BULLET2_SPRITE";
    pub const TRAIL_SCALE: f32 = 0.1;
    /// Particles render as squares of this size
    pub const PARTICLE_SIZE: f32 = 5.0;
}

/// HUD constants
pub mod hud {
    /// One health bar segment per this many health points
    pub const HEALTH_PER_SEGMENT: u32 = 4;
    /// First segment x and the segment row y
    pub const SEGMENT_START_X: f32 = 8.0;
    pub const SEGMENT_Y: f32 = 40.0;
    /// Health percentage label position
    pub const HEALTH_TEXT_POS: (f32, f32) = (250.0, 90.0);
    pub const HEALTH_TEXT_COLOR: &str = "#ff8c00";
    pub const HUD_FONT: &str = "24px Arial";

    /// Ammunition wheel shows this many slots starting at the selection
    pub const AMMO_SLOTS: usize = 5;
    /// Arsenal slots with unlimited rounds
    pub const INFINITE_AMMO_SLOTS: usize = 2;
    pub const AMMO_TEXT_COLOR: &str = "#ffffffff";
    pub const AMMO_ICON_X: f32 = 50.0;
    pub const AMMO_COUNT_X: f32 = 100.0;
    pub const AMMO_MARKER_X: f32 = 175.0;
    pub const AMMO_ROW_HEIGHT: f32 = 50.0;
    pub const AMMO_TOP_MARGIN: f32 = 30.0;
}

/// Sprite and sound names the core refers to directly
pub mod assets {
    pub const SPRITE_PREFIX: &str = "SpriteType.";
    pub const SOUND_PREFIX: &str = "SoundType.";

    pub const PLANET_SPRITE: &str = "PLANET_SPRITE";
    pub const TURRET_SPRITE: &str = "TURRET1_SPRITE";
    pub const TREADS_SPRITE: &str = "TREADS1_SPRITE";
    pub const BODY_SPRITE: &str = "GREYBODY1_SPRITE";
    pub const HPBAR_SPRITE: &str = "HPBAR_SPRITE";
    pub const HPSEGMENT_SPRITE: &str = "HPSEGMENT_SPRITE";

    pub const GAME_MUSIC: &str = "SCIFI_MUSIC";

    /// Sprite discriminators the server uses for tank records
    pub const TANK_SPRITES: [&str; 21] = [
        "PLAYER_SPRITE",
        "GREY1_SPRITE",
        "GREY2_SPRITE",
        "GREY3_SPRITE",
        "GREY4_SPRITE",
        "GREY5_SPRITE",
        "GREEN1_SPRITE",
        "GREEN2_SPRITE",
        "GREEN3_SPRITE",
        "GREEN4_SPRITE",
        "GREEN5_SPRITE",
        "DESERT1_SPRITE",
        "DESERT2_SPRITE",
        "DESERT3_SPRITE",
        "DESERT4_SPRITE",
        "DESERT5_SPRITE",
        "NAVY1_SPRITE",
        "NAVY2_SPRITE",
        "NAVY3_SPRITE",
        "NAVY4_SPRITE",
        "NAVY5_SPRITE",
    ];

    /// Sprite discriminators the server uses for projectiles
    pub const PROJECTILE_SPRITES: [&str; 13] = [
        "BULLET_SPRITE",
        "BULLET2_SPRITE",
        "BULLET3_SPRITE",
        "BULLET4_SPRITE",
        "BULLET5_SPRITE",
        "BULLET6_SPRITE",
        "BULLET7_SPRITE",
        "BULLET8_SPRITE",
        "BULLET9_SPRITE",
        "BULLET10_SPRITE",
        "BULLET11_SPRITE",
        "BULLET12_SPRITE",
        "MINE_SPRITE",
    ];
}

/// Network constants
pub mod net {
    /// Maximum framed message size (bytes)
    pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;
    /// Default bounded queue capacities
    pub const INBOUND_CAPACITY: usize = 4096;
    pub const OUTBOUND_CAPACITY: usize = 1024;
    /// Outbound slots only one-shot intents may use (at most half the queue)
    pub const OUTBOUND_RESERVE: usize = 64;
}
