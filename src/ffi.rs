//! C ABI over [`crate::commands`] for engine plugin loaders

use crate::commands;
use std::ffi::{c_char, CStr, CString};
use std::ptr;

/// Camera catalog as a heap C string; release it with [`camtex_free_string`].
#[no_mangle]
pub extern "C" fn camtex_list_cameras() -> *mut c_char {
    match CString::new(commands::list_cameras()) {
        Ok(catalog) => catalog.into_raw(),
        Err(e) => {
            log::error!("Camera catalog is not a valid C string: {}", e);
            ptr::null_mut()
        }
    }
}

/// # Safety
///
/// `value` must be null or a pointer returned by [`camtex_list_cameras`]
/// that has not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn camtex_free_string(value: *mut c_char) {
    if !value.is_null() {
        drop(CString::from_raw(value));
    }
}

/// Texture name of the started session, or -1.
///
/// # Safety
///
/// `camera_id` must be null or point to a NUL-terminated string that stays
/// valid for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn camtex_start_camera(
    camera_id: *const c_char,
    width: i32,
    height: i32,
) -> i32 {
    let camera_id = if camera_id.is_null() {
        None
    } else {
        match CStr::from_ptr(camera_id).to_str() {
            Ok(id) => Some(id),
            Err(e) => {
                log::error!("Camera id is not UTF-8: {}", e);
                commands::stop_camera();
                return -1;
            }
        }
    };
    commands::start_camera(camera_id, width, height)
}

#[no_mangle]
pub extern "C" fn camtex_update_texture() {
    commands::update_texture();
}

#[no_mangle]
pub extern "C" fn camtex_stop_camera() {
    commands::stop_camera();
}
