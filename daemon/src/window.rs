//! Top-level window helpers for the game process.
//!
//! On Windows these enumerate the visible top-level windows owned by a process
//! id. On other platforms they compile but find nothing.

/// Whether this platform can act on game windows at all.
pub const SUPPORTED: bool = cfg!(windows);

// ── Windows implementation ─────────────────────────────────────────────────────

#[cfg(windows)]
mod imp {
    use windows::Win32::Foundation::{BOOL, HWND, LPARAM};
    use windows::Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetWindowThreadProcessId, IsHungAppWindow, IsWindowVisible, ShowWindow,
        SW_MINIMIZE,
    };

    struct Search {
        pid: u32,
        found: Vec<HWND>,
    }

    unsafe extern "system" fn collect(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let search = &mut *(lparam.0 as *mut Search);
        let mut owner = 0u32;
        GetWindowThreadProcessId(hwnd, Some(&mut owner as *mut u32));
        if owner == search.pid && IsWindowVisible(hwnd).as_bool() {
            search.found.push(hwnd);
        }
        // Keep enumerating; returning FALSE makes EnumWindows report an error.
        BOOL(1)
    }

    pub fn process_windows(pid: u32) -> Vec<HWND> {
        let mut search = Search { pid, found: Vec::new() };
        let _ = unsafe {
            EnumWindows(Some(collect), LPARAM(&mut search as *mut Search as isize))
        };
        search.found
    }

    pub fn minimize(pid: u32) -> usize {
        let windows = process_windows(pid);
        for hwnd in &windows {
            unsafe {
                let _ = ShowWindow(*hwnd, SW_MINIMIZE);
            }
        }
        windows.len()
    }

    pub fn is_hung(pid: u32) -> bool {
        process_windows(pid)
            .into_iter()
            .any(|hwnd| unsafe { IsHungAppWindow(hwnd).as_bool() })
    }
}

// ── Public API ─────────────────────────────────────────────────────────────────

/// Minimizes every visible top-level window of `pid`. Returns how many were found.
pub fn minimize_process_windows(pid: u32) -> usize {
    #[cfg(windows)]
    {
        imp::minimize(pid)
    }
    #[cfg(not(windows))]
    {
        let _ = pid;
        0
    }
}

/// True if the OS reports any of `pid`'s windows as not responding.
pub fn is_process_hung(pid: u32) -> bool {
    #[cfg(windows)]
    {
        imp::is_hung(pid)
    }
    #[cfg(not(windows))]
    {
        let _ = pid;
        false
    }
}
