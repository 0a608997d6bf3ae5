pub mod account;
pub mod instance;
pub mod settings;

pub use account::{Account, AccountKind, AccountMeta, PlayerProfile, Skin};
pub use instance::{Instance, LoaderSpec, ServerStatus};
pub use settings::{
    CloseBehavior, ConfigClient, GameConfig, JavaConfig, LauncherConfig, MemoryRange, ScreenSize,
    Theme,
};
