use std::ffi::{CStr, CString};
use std::mem::ManuallyDrop;
use std::ptr::{self, NonNull};
use std::sync::Once;

use tracing::{debug, info, warn};

use crate::isp_pipeline::common::{
    check_status, function_name, mmal_error, IspError, MmalStatus, Result,
};
use crate::isp_pipeline::component::isp_component::IspComponent;
use crate::isp_pipeline::component::types::{BufferFlags, IspBuffer, Port, WaitMode};
use crate::isp_pipeline::format::{Encoding, PortFormat, Rect};

#[allow(non_upper_case_globals)]
#[allow(non_camel_case_types)]
#[allow(non_snake_case)]
#[allow(dead_code)]
mod mmal {
    include!(concat!(env!("OUT_DIR"), "/mmal_bindings.rs"));
}

// Header flags are stored as-is, so the bit layout has to match the firmware's
const _: () = {
    assert!(BufferFlags::EOS.bits() == mmal::MMAL_BUFFER_HEADER_FLAG_EOS as u32);
    assert!(BufferFlags::FRAME_START.bits() == mmal::MMAL_BUFFER_HEADER_FLAG_FRAME_START as u32);
    assert!(BufferFlags::FRAME_END.bits() == mmal::MMAL_BUFFER_HEADER_FLAG_FRAME_END as u32);
};

static HOST_INIT: Once = Once::new();

/// Runs an MMAL call and turns a non-success status into `IspError::Mmal` naming the
/// call and the function it was made from.
macro_rules! mmal_check {
    ($call:expr) => {
        check_status(unsafe { $call } as u32, function_name!(), stringify!($call))
    };
}

fn wait_flags(wait: WaitMode) -> u32 {
    match wait {
        WaitMode::Wait => mmal::MMAL_WRAPPER_FLAG_WAIT as u32,
        WaitMode::NoWait => 0,
    }
}

/// A buffer header from one of the wrapper's pools.
///
/// Released back to its pool on drop unless handed to a port. Must not
/// outlive the `MmalIsp` it came from.
pub struct MmalBuffer {
    header: NonNull<mmal::MMAL_BUFFER_HEADER_T>,
}

impl MmalBuffer {
    fn into_raw(self) -> *mut mmal::MMAL_BUFFER_HEADER_T {
        ManuallyDrop::new(self).header.as_ptr()
    }
}

impl Drop for MmalBuffer {
    fn drop(&mut self) {
        unsafe { mmal::mmal_buffer_header_release(self.header.as_ptr()) };
    }
}

impl IspBuffer for MmalBuffer {
    fn capacity(&self) -> usize {
        unsafe { self.header.as_ref().alloc_size as usize }
    }

    fn length(&self) -> usize {
        unsafe { self.header.as_ref().length as usize }
    }

    fn set_length(&mut self, length: usize) {
        let length = length.min(self.capacity());
        unsafe { self.header.as_mut().length = length as u32 };
    }

    fn payload(&self) -> &[u8] {
        let header = unsafe { self.header.as_ref() };
        if header.data.is_null() {
            return &[];
        }
        unsafe {
            std::slice::from_raw_parts(
                header.data.add(header.offset as usize),
                header.length as usize,
            )
        }
    }

    fn data_mut(&mut self) -> &mut [u8] {
        let header = unsafe { self.header.as_mut() };
        if header.data.is_null() {
            return &mut [];
        }
        unsafe { std::slice::from_raw_parts_mut(header.data, header.alloc_size as usize) }
    }

    fn flags(&self) -> BufferFlags {
        BufferFlags::from_bits_retain(unsafe { self.header.as_ref().flags })
    }

    fn set_flags(&mut self, flags: BufferFlags) {
        unsafe { self.header.as_mut().flags = flags.bits() };
    }
}

/// The VideoCore ISP behind the MMAL synchronous component wrapper.
pub struct MmalIsp {
    wrapper: NonNull<mmal::MMAL_WRAPPER_T>,
    name: String,
}

impl MmalIsp {
    pub fn create(name: &str) -> Result<Self> {
        HOST_INIT.call_once(|| unsafe { mmal::bcm_host_init() });

        let c_name = CString::new(name)
            .map_err(|_| IspError::InvalidArgument(format!("component name {:?}", name)))?;
        let mut wrapper: *mut mmal::MMAL_WRAPPER_T = ptr::null_mut();
        mmal_check!(mmal::mmal_wrapper_create(&mut wrapper, c_name.as_ptr()))?;
        let wrapper = NonNull::new(wrapper)
            .ok_or_else(|| mmal_error!("mmal_wrapper_create", MmalStatus::ENoMem))?;

        info!("Created MMAL component {}", name);
        Ok(Self {
            wrapper,
            name: name.to_string(),
        })
    }

    fn port_ptr(&self, port: Port) -> Result<*mut mmal::MMAL_PORT_T> {
        let wrapper = unsafe { self.wrapper.as_ref() };
        let (ports, count) = match port {
            Port::Input => (wrapper.input, wrapper.input_num),
            Port::Output => (wrapper.output, wrapper.output_num),
        };
        if count == 0 || ports.is_null() {
            return Err(IspError::InvalidArgument(format!("{} has no {}", self.name, port)));
        }
        Ok(unsafe { *ports })
    }

    fn port_name(port: *mut mmal::MMAL_PORT_T) -> String {
        unsafe {
            if (*port).name.is_null() {
                return String::new();
            }
            CStr::from_ptr((*port).name).to_string_lossy().into_owned()
        }
    }
}

impl Drop for MmalIsp {
    fn drop(&mut self) {
        let status = unsafe { mmal::mmal_wrapper_destroy(self.wrapper.as_ptr()) } as u32;
        if let Err(e) = check_status(status, function_name!(), "mmal_wrapper_destroy") {
            warn!("Failed to destroy {}: {}", self.name, e);
        }
    }
}

impl IspComponent for MmalIsp {
    type Buffer = MmalBuffer;

    fn name(&self) -> &str {
        &self.name
    }

    fn commit_format(&mut self, port: Port, format: &PortFormat) -> Result<()> {
        let port = self.port_ptr(port)?;

        unsafe {
            let es_format = (*port).format;
            (*es_format).encoding = format.encoding.to_fourcc();
            let video = &mut (*(*es_format).es).video;
            video.width = format.width as u32;
            video.height = format.height as u32;
            video.crop.x = format.crop.x as i32;
            video.crop.y = format.crop.y as i32;
            video.crop.width = format.crop.width as i32;
            video.crop.height = format.crop.height as i32;
        }

        debug!("Committing format on {}", Self::port_name(port));
        mmal_check!(mmal::mmal_port_format_commit(port))
    }

    fn port_format(&self, port: Port) -> Option<PortFormat> {
        let port = self.port_ptr(port).ok()?;
        unsafe {
            let es_format = (*port).format;
            let encoding = Encoding::from_fourcc((*es_format).encoding).ok()?;
            let video = &(*(*es_format).es).video;
            Some(PortFormat {
                encoding,
                width: video.width as usize,
                height: video.height as usize,
                crop: Rect {
                    x: video.crop.x as usize,
                    y: video.crop.y as usize,
                    width: video.crop.width as usize,
                    height: video.crop.height as usize,
                },
            })
        }
    }

    fn enable_port(&mut self, port: Port) -> Result<()> {
        let port = self.port_ptr(port)?;
        mmal_check!(mmal::mmal_wrapper_port_enable(
            port,
            mmal::MMAL_WRAPPER_FLAG_PAYLOAD_ALLOCATE as u32
        ))?;
        unsafe {
            debug!(
                "Enabled {} with {} buffers of {} bytes",
                Self::port_name(port),
                (*port).buffer_num,
                (*port).buffer_size
            );
        }
        Ok(())
    }

    fn buffer_get_empty(&mut self, port: Port, wait: WaitMode) -> Result<Option<MmalBuffer>> {
        let port = self.port_ptr(port)?;
        let mut header: *mut mmal::MMAL_BUFFER_HEADER_T = ptr::null_mut();
        let raw =
            unsafe { mmal::mmal_wrapper_buffer_get_empty(port, &mut header, wait_flags(wait)) } as u32;
        if wait == WaitMode::NoWait && MmalStatus::from_raw(raw) == MmalStatus::EAgain {
            return Ok(None);
        }
        check_status(
            raw,
            function_name!(),
            "mmal_wrapper_buffer_get_empty(port, &mut header, wait_flags(wait))",
        )?;
        Ok(NonNull::new(header).map(|header| MmalBuffer { header }))
    }

    fn send_buffer(&mut self, port: Port, buffer: MmalBuffer) -> Result<()> {
        let port = self.port_ptr(port)?;
        let header = buffer.into_raw();
        let result = mmal_check!(mmal::mmal_port_send_buffer(port, header));
        if result.is_err() {
            // The port did not take it, so it is still ours to return
            unsafe { mmal::mmal_buffer_header_release(header) };
        }
        result
    }

    fn buffer_get_full(&mut self, port: Port, wait: WaitMode) -> Result<Option<MmalBuffer>> {
        let port = self.port_ptr(port)?;
        let mut header: *mut mmal::MMAL_BUFFER_HEADER_T = ptr::null_mut();
        let raw =
            unsafe { mmal::mmal_wrapper_buffer_get_full(port, &mut header, wait_flags(wait)) } as u32;
        if wait == WaitMode::NoWait && MmalStatus::from_raw(raw) == MmalStatus::EAgain {
            return Ok(None);
        }
        check_status(
            raw,
            function_name!(),
            "mmal_wrapper_buffer_get_full(port, &mut header, wait_flags(wait))",
        )?;
        Ok(NonNull::new(header).map(|header| MmalBuffer { header }))
    }
}
