/// Program and arguments that power the machine off on `os`
/// (as reported by `std::env::consts::OS`).
pub fn shutdown_command(os: &str) -> (&'static str, &'static [&'static str]) {
    if os == "windows" {
        ("shutdown", &["/s", "/t", "1"])
    } else {
        ("shutdown", &["-h", "now"])
    }
}

/// Whether the process can be expected to have permission to halt the machine.
pub fn is_privileged() -> bool {
    #[cfg(unix)]
    {
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        // Windows lets ordinary users shut down their own session
        true
    }
}
