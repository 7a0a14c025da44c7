//! Host plugin ABI: the records the host hands over and the registration table.
//!
//! Layouts mirror the host's plugin header field for field. The table is a
//! process-wide immutable `static`; nothing here holds mutable state.

use roxbridge_core::StkData;
use std::ffi::{c_char, CStr};

/// Host `BOOL`.
pub type HostBool = i32;
pub const TRUE: HostBool = 1;
pub const FALSE: HostBool = 0;

/// Signature of every formula callback: element count, output array, three inputs.
pub type PluginCalcFn = extern "C" fn(i32, *mut f32, *mut f32, *mut f32, *mut f32);

/// One registration entry.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct PluginFuncInfo {
    /// 1-based function number used in formulas (`TDXDLL1(1, ...)`).
    pub func_mark: u16,
    /// Always 0 for array callbacks.
    pub call_type: u16,
    pub call: Option<PluginCalcFn>,
}

impl PluginFuncInfo {
    /// All-zero entry that ends the table.
    pub const TERMINATOR: Self = Self {
        func_mark: 0,
        call_type: 0,
        call: None,
    };

    pub fn is_terminator(&self) -> bool {
        self.func_mark == 0 && self.call.is_none()
    }
}

/// Function number of the remote-signal formula.
pub const ROX_SIGNAL_MARK: u16 = 1;

static FUNCS: [PluginFuncInfo; 2] = [
    PluginFuncInfo {
        func_mark: ROX_SIGNAL_MARK,
        call_type: 0,
        call: Some(crate::rox_signal),
    },
    PluginFuncInfo::TERMINATOR,
];

/// The registration table, terminator included.
pub fn functions() -> &'static [PluginFuncInfo] {
    &FUNCS
}

/// Registration entry point called once by the host after loading the library.
///
/// # Safety
/// `out` must be null or valid for one pointer-sized write.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn RegisterTdxFunc(out: *mut *const PluginFuncInfo) -> HostBool {
    if out.is_null() {
        return FALSE;
    }
    *out = FUNCS.as_ptr();
    TRUE
}

/// Calculation context some hosts expose alongside the bar array.
///
/// Not delivered through [`PluginCalcFn`]; only hosts with an extended
/// interface can supply it.
#[repr(C)]
#[derive(Debug)]
pub struct CalcInfo {
    pub size: u32,
    pub version: u32,
    pub serial: u32,
    /// NUL-terminated instrument code, e.g. `600519`.
    pub stock_label: *const c_char,
    pub is_index: HostBool,
    pub num_data: i32,
    pub data: *const StkData,
}

impl CalcInfo {
    /// Instrument code, if present and valid UTF-8.
    ///
    /// # Safety
    /// `stock_label` must be null or point to a NUL-terminated string that
    /// outlives the returned borrow.
    pub unsafe fn label(&self) -> Option<&str> {
        if self.stock_label.is_null() {
            return None;
        }
        CStr::from_ptr(self.stock_label).to_str().ok()
    }

    /// Bar records, empty when the pointer is null or the count is not positive.
    ///
    /// # Safety
    /// `data` must be null or valid for `num_data` reads of `StkData` that
    /// outlive the returned borrow.
    pub unsafe fn bars(&self) -> &[StkData] {
        match usize::try_from(self.num_data) {
            Ok(n) if n > 0 && !self.data.is_null() => std::slice::from_raw_parts(self.data, n),
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn table_has_one_function_and_terminator() {
        let funcs = functions();
        assert_eq!(funcs.len(), 2);
        assert_eq!(funcs[0].func_mark, ROX_SIGNAL_MARK);
        assert_eq!(funcs[0].call_type, 0);
        assert!(funcs[0].call.is_some());
        assert!(funcs[1].is_terminator());
    }

    #[test]
    fn entry_layout_matches_host() {
        // Two u16 then a pointer, padded to pointer alignment.
        let ptr = std::mem::size_of::<usize>();
        assert_eq!(std::mem::size_of::<PluginFuncInfo>(), ptr * 2);
    }

    #[test]
    fn calc_info_views() {
        let label = CString::new("600519").unwrap();
        let bars = [StkData {
            time: 20240102,
            close: 10.0,
            volume: 500.0,
            ..StkData::default()
        }];
        let info = CalcInfo {
            size: std::mem::size_of::<CalcInfo>() as u32,
            version: 1,
            serial: 7,
            stock_label: label.as_ptr(),
            is_index: FALSE,
            num_data: 1,
            data: bars.as_ptr(),
        };
        unsafe {
            assert_eq!(info.label(), Some("600519"));
            assert_eq!(info.bars(), &bars);
        }
    }

    #[test]
    fn calc_info_tolerates_nulls() {
        let info = CalcInfo {
            size: 0,
            version: 0,
            serial: 0,
            stock_label: std::ptr::null(),
            is_index: FALSE,
            num_data: 5,
            data: std::ptr::null(),
        };
        unsafe {
            assert_eq!(info.label(), None);
            assert!(info.bars().is_empty());
        }
    }
}
