use mixerctl::{
    device::PlatformTransport,
    error::MixerError,
    log::{oops, parse_log_level},
    mixer::Mixer,
    settings::{self, Settings},
};
use tracing::{error, info, warn};

fn main() {
    parse_log_level();

    let dirs = settings::scaffold()
        .unwrap_or_else(|| oops("No home directory to keep settings in", 1));
    let settings = Settings::init(dirs.config_dir())
        .unwrap_or_else(|e| oops(format!("Failed to load settings: {}", e), 1));

    let app = settings.r().app();
    let mut mixer = Mixer::<PlatformTransport>::new(
        app.device().as_deref(),
        app.layout,
        app.refresh_interval(),
    )
    .unwrap_or_else(|e| oops(format!("Failed to open the mixer: {}", e), 2));

    for (id, config) in app.overrides() {
        match config
            .map_err(MixerError::from)
            .and_then(|c| mixer.configure(id, &c))
        {
            Ok(()) => info!("Applied settings to {}", id),
            Err(e) => warn!("Ignoring settings for {}: {}", id, e),
        }
    }

    match mixer.properties() {
        Ok(p) => info!("{} {} on {}", p.name, p.version, p.device),
        Err(e) => warn!("No device properties: {}", e),
    }

    mixer.show_class(app.view.as_deref());
    drop(app);
    print!("{}", mixer.surface());

    let timer = mixer.timer_handle();
    if let Err(e) = ctrlc::set_handler(move || timer.cancel()) {
        error!("Failed to set the Ctrl-C handler: {}", e);
    }
    async_std::task::block_on(mixer.run());

    println!("mixerctl exiting, goodbye");
}
