//! BLE peripheral adapter.
//!
//! Implements [`LinkPort`], the outbound half of the wireless transport.
//! Connect / disconnect callbacks are recorded in a
//! [`LinkState`](crate::events::LinkState) and writes are pushed into the
//! [`events`](crate::events) queue.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: Bluedroid BLE GATT server via `esp_idf_svc::sys`.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## GATT Service Layout
//!
//! | Characteristic | UUID                                     | Perms             |
//! |----------------|------------------------------------------|-------------------|
//! | Message        | `12345678-1234-5678-1234-56789abcdef1`   | Read+Write+Notify |
//! | Device ID      | `12345678-1234-5678-1234-56789abcdef2`   | Read              |
//!
//! The message characteristic carries a Client Characteristic Configuration
//! descriptor (0x2902) so centrals can subscribe.

use core::fmt;
use log::{info, warn};

use crate::app::ports::LinkPort;
use crate::events::{EventQueue, LinkState};

// ───────────────────────────────────────────────────────────────
// Constants
// ───────────────────────────────────────────────────────────────

pub const SERVICE_UUID: u128 = 0x12345678_1234_5678_1234_56789abcdef0;
pub const CHAR_MESSAGE: u128 = 0x12345678_1234_5678_1234_56789abcdef1;
pub const CHAR_DEVICE_ID: u128 = 0x12345678_1234_5678_1234_56789abcdef2;

/// Largest characteristic value the adapter will store or notify.
pub const MAX_VALUE_LEN: usize = 512;

/// Message characteristic value before anything has been notified.
pub const INITIAL_MESSAGE: &str = "Ready";

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// No central is connected; the value was stored but not pushed.
    NotConnected,
    /// Payload exceeds [`MAX_VALUE_LEN`].
    PayloadTooLong,
    /// Bluetooth controller or host stack failed to come up.
    StackInitFailed,
    /// The stack rejected a call (ESP-IDF error code).
    Io(i32),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "BLE: no central connected"),
            Self::PayloadTooLong => write!(f, "BLE: payload exceeds {} bytes", MAX_VALUE_LEN),
            Self::StackInitFailed => write!(f, "BLE stack initialisation failed"),
            Self::Io(rc) => write!(f, "BLE: stack call failed (rc={})", rc),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// BLE state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleState {
    Idle,
    Advertising,
    Connected,
    Failed,
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF Bluedroid bridge
// ───────────────────────────────────────────────────────────────
//
// Bluedroid callbacks are C function pointers that cannot capture Rust
// closures. These statics bridge the callback context to the adapter;
// domain state is never touched from the Bluedroid task.

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};

#[cfg(target_os = "espidf")]
static BLE_GATTS_IF: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CONN_ID: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_MTU: AtomicU32 = AtomicU32::new(23);
#[cfg(target_os = "espidf")]
static BLE_SVC_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_MESSAGE_CHAR_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_DEVICE_ID_CHAR_HANDLE: AtomicU32 = AtomicU32::new(0);
#[cfg(target_os = "espidf")]
static BLE_CHAR_STEP: AtomicU32 = AtomicU32::new(0);

/// Queue the GATTS write callback pushes into; set once in `platform_start`.
#[cfg(target_os = "espidf")]
static BLE_EVENT_QUEUE: std::sync::OnceLock<&'static EventQueue> = std::sync::OnceLock::new();
/// Connection level the GATTS connect / disconnect callbacks record into.
#[cfg(target_os = "espidf")]
static BLE_LINK: std::sync::OnceLock<&'static LinkState> = std::sync::OnceLock::new();
/// Advertised name; needed again when the device-id characteristic is added.
#[cfg(target_os = "espidf")]
static BLE_DEVICE_NAME: std::sync::OnceLock<std::ffi::CString> = std::sync::OnceLock::new();

#[cfg(target_os = "espidf")]
static SERVICE_UUID_LE: [u8; 16] = SERVICE_UUID.to_le_bytes();

#[cfg(target_os = "espidf")]
const CCCD_UUID: u16 = 0x2902;

#[cfg(target_os = "espidf")]
fn uuid128_to_esp(uuid: u128) -> esp_idf_svc::sys::esp_bt_uuid_t {
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 16;
    t.uuid.uuid128 = uuid.to_le_bytes();
    t
}

#[cfg(target_os = "espidf")]
fn uuid16_to_esp(uuid: u16) -> esp_idf_svc::sys::esp_bt_uuid_t {
    let mut t: esp_idf_svc::sys::esp_bt_uuid_t = unsafe { core::mem::zeroed() };
    t.len = 2;
    t.uuid.uuid16 = uuid;
    t
}

#[cfg(target_os = "espidf")]
fn adv_params() -> esp_idf_svc::sys::esp_ble_adv_params_t {
    use esp_idf_svc::sys::*;
    esp_ble_adv_params_t {
        adv_int_min: 0x20,
        adv_int_max: 0x40,
        adv_type: esp_ble_adv_type_t_ADV_TYPE_IND,
        own_addr_type: esp_ble_addr_type_t_BLE_ADDR_TYPE_PUBLIC,
        channel_map: esp_ble_adv_channel_t_ADV_CHNL_ALL,
        adv_filter_policy: esp_ble_adv_filter_t_ADV_FILTER_ALLOW_SCAN_ANY_CON_ANY,
        ..unsafe { core::mem::zeroed() }
    }
}

/// Add a characteristic whose value the stack stores and answers reads for.
#[cfg(target_os = "espidf")]
unsafe fn add_gatt_char(svc_handle: u16, uuid: u128, perm: u32, prop: u32, initial: &[u8]) {
    use esp_idf_svc::sys::*;
    let mut char_uuid = uuid128_to_esp(uuid);
    let mut value = esp_attr_value_t {
        attr_max_len: MAX_VALUE_LEN as u16,
        attr_len: initial.len() as u16,
        attr_value: initial.as_ptr() as *mut u8,
    };
    let mut control = esp_attr_control_t {
        auto_rsp: ESP_GATT_AUTO_RSP as u8,
    };
    // SAFETY: Bluedroid copies the initial value before returning.
    unsafe {
        esp_ble_gatts_add_char(
            svc_handle,
            &mut char_uuid,
            perm as esp_gatt_perm_t,
            prop as esp_gatt_char_prop_t,
            &mut value,
            &mut control,
        );
    }
}

#[cfg(target_os = "espidf")]
fn push_from_callback(event: crate::events::TransportEvent) {
    match BLE_EVENT_QUEUE.get() {
        Some(queue) => {
            crate::events::push_event(queue, event);
        }
        None => log::warn!("BLE: event before queue registration dropped"),
    }
}

#[cfg(target_os = "espidf")]
fn record_link_from_callback(connected: bool) {
    match BLE_LINK.get() {
        Some(link) => link.record(connected),
        None => log::warn!("BLE: link change before registration ignored"),
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gap_event_handler(
    event: esp_idf_svc::sys::esp_gap_ble_cb_event_t,
    param: *mut esp_idf_svc::sys::esp_ble_gap_cb_param_t,
) {
    use esp_idf_svc::sys::*;
    match event {
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_DATA_SET_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising data set");
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_SCAN_RSP_DATA_SET_COMPLETE_EVT => {
            // Scan response is configured last; both payloads are in place.
            let mut params = adv_params();
            unsafe {
                esp_ble_gap_start_advertising(&mut params);
            }
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_START_COMPLETE_EVT => {
            let status = unsafe { (*param).adv_start_cmpl.status };
            if status == esp_bt_status_t_ESP_BT_STATUS_SUCCESS {
                log::info!("BLE GAP: advertising started");
            } else {
                log::error!("BLE GAP: advertising start failed (status={})", status);
            }
        }
        esp_gap_ble_cb_event_t_ESP_GAP_BLE_ADV_STOP_COMPLETE_EVT => {
            log::info!("BLE GAP: advertising stopped");
        }
        _ => {}
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn ble_gatts_event_handler(
    event: esp_idf_svc::sys::esp_gatts_cb_event_t,
    gatts_if: esp_idf_svc::sys::esp_gatt_if_t,
    param: *mut esp_idf_svc::sys::esp_ble_gatts_cb_param_t,
) {
    use crate::events::TransportEvent;
    use esp_idf_svc::sys::*;

    match event {
        esp_gatts_cb_event_t_ESP_GATTS_REG_EVT => {
            BLE_GATTS_IF.store(gatts_if as u32, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: app registered (if={})", gatts_if);
            unsafe {
                if let Some(name) = BLE_DEVICE_NAME.get() {
                    esp_ble_gap_set_device_name(name.as_ptr());
                }
                configure_advertising();

                let mut svc_id = esp_gatt_srvc_id_t {
                    id: esp_gatt_id_t {
                        uuid: uuid128_to_esp(SERVICE_UUID),
                        inst_id: 0,
                    },
                    is_primary: true,
                };
                // service + 2 characteristics (2 handles each) + CCCD
                esp_ble_gatts_create_service(gatts_if, &mut svc_id, 6);
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_CREATE_EVT => {
            let svc_handle = unsafe { (*param).create.service_handle };
            BLE_SVC_HANDLE.store(u32::from(svc_handle), AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: service created (handle={})", svc_handle);
            BLE_CHAR_STEP.store(1, AtomicOrdering::Relaxed);
            unsafe {
                esp_ble_gatts_start_service(svc_handle);
                add_gatt_char(
                    svc_handle,
                    CHAR_MESSAGE,
                    ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE,
                    ESP_GATT_CHAR_PROP_BIT_READ
                        | ESP_GATT_CHAR_PROP_BIT_WRITE
                        | ESP_GATT_CHAR_PROP_BIT_NOTIFY,
                    INITIAL_MESSAGE.as_bytes(),
                );
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_EVT => {
            let handle = unsafe { (*param).add_char.attr_handle };
            let svc_handle = BLE_SVC_HANDLE.load(AtomicOrdering::Relaxed) as u16;
            match BLE_CHAR_STEP.load(AtomicOrdering::Relaxed) {
                1 => {
                    BLE_MESSAGE_CHAR_HANDLE.store(u32::from(handle), AtomicOrdering::Relaxed);
                    log::info!("BLE GATTS: message char (handle={})", handle);
                    BLE_CHAR_STEP.store(2, AtomicOrdering::Relaxed);
                    let mut cccd_uuid = uuid16_to_esp(CCCD_UUID);
                    let mut cccd = [0u8; 2];
                    let mut value = esp_attr_value_t {
                        attr_max_len: 2,
                        attr_len: 2,
                        attr_value: cccd.as_mut_ptr(),
                    };
                    let mut control = esp_attr_control_t {
                        auto_rsp: ESP_GATT_AUTO_RSP as u8,
                    };
                    unsafe {
                        esp_ble_gatts_add_char_descr(
                            svc_handle,
                            &mut cccd_uuid,
                            (ESP_GATT_PERM_READ | ESP_GATT_PERM_WRITE) as esp_gatt_perm_t,
                            &mut value,
                            &mut control,
                        );
                    }
                }
                3 => {
                    BLE_DEVICE_ID_CHAR_HANDLE.store(u32::from(handle), AtomicOrdering::Relaxed);
                    BLE_CHAR_STEP.store(4, AtomicOrdering::Relaxed);
                    log::info!(
                        "BLE GATTS: device-id char (handle={}), all registered",
                        handle
                    );
                }
                _ => {}
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_ADD_CHAR_DESCR_EVT => {
            if BLE_CHAR_STEP.load(AtomicOrdering::Relaxed) == 2 {
                let handle = unsafe { (*param).add_char_descr.attr_handle };
                log::info!("BLE GATTS: CCCD (handle={})", handle);
                BLE_CHAR_STEP.store(3, AtomicOrdering::Relaxed);
                let svc_handle = BLE_SVC_HANDLE.load(AtomicOrdering::Relaxed) as u16;
                let name = BLE_DEVICE_NAME
                    .get()
                    .map(|n| n.as_bytes())
                    .unwrap_or_default();
                unsafe {
                    add_gatt_char(
                        svc_handle,
                        CHAR_DEVICE_ID,
                        ESP_GATT_PERM_READ,
                        ESP_GATT_CHAR_PROP_BIT_READ,
                        name,
                    );
                }
            }
        }
        esp_gatts_cb_event_t_ESP_GATTS_CONNECT_EVT => {
            let conn_id = unsafe { (*param).connect.conn_id };
            BLE_CONN_ID.store(u32::from(conn_id), AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: central connected (conn_id={})", conn_id);
            record_link_from_callback(true);
        }
        esp_gatts_cb_event_t_ESP_GATTS_DISCONNECT_EVT => {
            BLE_MTU.store(23, AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: central disconnected");
            record_link_from_callback(false);
        }
        esp_gatts_cb_event_t_ESP_GATTS_MTU_EVT => {
            let mtu = unsafe { (*param).mtu.mtu };
            BLE_MTU.store(u32::from(mtu), AtomicOrdering::Relaxed);
            log::info!("BLE GATTS: MTU {}", mtu);
        }
        esp_gatts_cb_event_t_ESP_GATTS_WRITE_EVT => {
            let p = unsafe { &(*param).write };
            if u32::from(p.handle) == BLE_MESSAGE_CHAR_HANDLE.load(AtomicOrdering::Relaxed) {
                // SAFETY: Bluedroid guarantees `value` points to `len` bytes
                // for the duration of the callback.
                let data = unsafe { core::slice::from_raw_parts(p.value, p.len as usize) };
                push_from_callback(TransportEvent::write(data));
            }
        }
        _ => {}
    }
}

/// Advertisement: flags + 128-bit service UUID. Scan response: name.
#[cfg(target_os = "espidf")]
unsafe fn configure_advertising() {
    use esp_idf_svc::sys::*;
    let mut adv: esp_ble_adv_data_t = unsafe { core::mem::zeroed() };
    adv.set_scan_rsp = false;
    adv.include_name = false;
    adv.min_interval = 0x06;
    adv.max_interval = 0x12;
    adv.service_uuid_len = SERVICE_UUID_LE.len() as u16;
    adv.p_service_uuid = SERVICE_UUID_LE.as_ptr() as *mut u8;
    adv.flag = (ESP_BLE_ADV_FLAG_GEN_DISC | ESP_BLE_ADV_FLAG_BREDR_NOT_SPT) as u8;

    let mut scan_rsp: esp_ble_adv_data_t = unsafe { core::mem::zeroed() };
    scan_rsp.set_scan_rsp = true;
    scan_rsp.include_name = true;
    scan_rsp.include_txpower = true;

    unsafe {
        esp_ble_gap_config_adv_data(&mut adv);
        esp_ble_gap_config_adv_data(&mut scan_rsp);
    }
}

// ───────────────────────────────────────────────────────────────
// BLE adapter
// ───────────────────────────────────────────────────────────────

pub struct BleAdapter {
    state: BleState,
    device_name: heapless::String<24>,
    queue: &'static EventQueue,
    link: &'static LinkState,
    /// Mirror of the message characteristic value.
    message_value: heapless::Vec<u8, MAX_VALUE_LEN>,
    #[cfg(not(target_os = "espidf"))]
    sim_notifications: Vec<String>,
    #[cfg(not(target_os = "espidf"))]
    sim_advertising_restarts: u32,
}

impl BleAdapter {
    /// `queue` receives characteristic writes; `link` tracks the central.
    pub fn new(
        device_name: heapless::String<24>,
        queue: &'static EventQueue,
        link: &'static LinkState,
    ) -> Self {
        let mut message_value = heapless::Vec::new();
        let _ = message_value.extend_from_slice(INITIAL_MESSAGE.as_bytes());
        Self {
            state: BleState::Idle,
            device_name,
            queue,
            link,
            message_value,
            #[cfg(not(target_os = "espidf"))]
            sim_notifications: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_advertising_restarts: 0,
        }
    }

    pub fn state(&self) -> BleState {
        if self.is_connected() {
            BleState::Connected
        } else {
            self.state
        }
    }

    /// Initialise the stack, register the GATT service and start advertising.
    pub fn start(&mut self) -> Result<(), TransportError> {
        info!("BLE: starting advertising as '{}'", self.device_name);
        match self.platform_start() {
            Ok(()) => {
                self.state = BleState::Advertising;
                Ok(())
            }
            Err(e) => {
                self.state = BleState::Failed;
                Err(e)
            }
        }
    }

    /// Current value of the message characteristic (what a read returns).
    pub fn message_value(&self) -> &[u8] {
        &self.message_value
    }

    /// Value of the read-only device-id characteristic.
    pub fn device_id_value(&self) -> &str {
        &self.device_name
    }

    fn store_value(&mut self, payload: &str) -> Result<(), TransportError> {
        if payload.len() > MAX_VALUE_LEN {
            warn!(
                "BLE: payload too long ({} > {})",
                payload.len(),
                MAX_VALUE_LEN
            );
            return Err(TransportError::PayloadTooLong);
        }
        self.message_value.clear();
        // Cannot fail: length checked above.
        let _ = self.message_value.extend_from_slice(payload.as_bytes());
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_start(&mut self) -> Result<(), TransportError> {
        use esp_idf_svc::sys::*;

        let _ = BLE_EVENT_QUEUE.set(self.queue);
        let _ = BLE_LINK.set(self.link);
        let name = std::ffi::CString::new(self.device_name.as_str())
            .map_err(|_| TransportError::StackInitFailed)?;
        let _ = BLE_DEVICE_NAME.set(name);

        unsafe {
            // Release classic BT memory (BLE-only mode saves ~30 KB).
            esp_bt_controller_mem_release(esp_bt_mode_t_ESP_BT_MODE_CLASSIC_BT);

            let mut bt_cfg = esp_bt_controller_config_t::default();
            let ret = esp_bt_controller_init(&mut bt_cfg);
            if ret != ESP_OK as i32 {
                log::error!("BLE: bt_controller_init failed ({})", ret);
                return Err(TransportError::StackInitFailed);
            }

            let ret = esp_bt_controller_enable(esp_bt_mode_t_ESP_BT_MODE_BLE);
            if ret != ESP_OK as i32 {
                log::error!("BLE: bt_controller_enable failed ({})", ret);
                return Err(TransportError::StackInitFailed);
            }

            let ret = esp_bluedroid_init();
            if ret != ESP_OK as i32 {
                log::error!("BLE: bluedroid_init failed ({})", ret);
                return Err(TransportError::StackInitFailed);
            }

            let ret = esp_bluedroid_enable();
            if ret != ESP_OK as i32 {
                log::error!("BLE: bluedroid_enable failed ({})", ret);
                return Err(TransportError::StackInitFailed);
            }

            // Status JSON is ~200 bytes; ask for the largest MTU.
            esp_ble_gatt_set_local_mtu(517);

            // Registration continues in the GATTS callback (REG_EVT →
            // CREATE_EVT → ADD_CHAR_EVT ...), advertising starts once the
            // scan response is configured.
            esp_ble_gap_register_callback(Some(ble_gap_event_handler));
            esp_ble_gatts_register_callback(Some(ble_gatts_event_handler));
            esp_ble_gatts_app_register(0);
        }

        info!(
            "BLE(espidf): Bluedroid stack initialized, service {:032x}",
            SERVICE_UUID
        );
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start(&mut self) -> Result<(), TransportError> {
        info!(
            "BLE(sim): advertising '{}' (service {:032x})",
            self.device_name, SERVICE_UUID
        );
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_notify(&mut self, payload: &str) -> Result<(), TransportError> {
        use esp_idf_svc::sys::*;

        let handle = BLE_MESSAGE_CHAR_HANDLE.load(AtomicOrdering::Relaxed) as u16;
        if handle == 0 {
            return Err(TransportError::NotConnected);
        }
        unsafe {
            let ret = esp_ble_gatts_set_attr_value(handle, payload.len() as u16, payload.as_ptr());
            if ret != ESP_OK as i32 {
                return Err(TransportError::Io(ret));
            }
        }

        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        let mtu = BLE_MTU.load(AtomicOrdering::Relaxed) as usize;
        if payload.len() + 3 > mtu {
            warn!(
                "BLE: notification truncated to MTU ({} > {})",
                payload.len(),
                mtu - 3
            );
        }
        unsafe {
            let ret = esp_ble_gatts_send_indicate(
                BLE_GATTS_IF.load(AtomicOrdering::Relaxed) as esp_gatt_if_t,
                BLE_CONN_ID.load(AtomicOrdering::Relaxed) as u16,
                handle,
                payload.len() as u16,
                payload.as_ptr() as *mut u8,
                false,
            );
            if ret != ESP_OK as i32 {
                return Err(TransportError::Io(ret));
            }
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_notify(&mut self, payload: &str) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        self.sim_notifications.push(payload.to_owned());
        log::debug!("BLE(sim): notify {}", payload);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_restart_advertising(&mut self) -> Result<(), TransportError> {
        use esp_idf_svc::sys::*;
        let mut params = adv_params();
        let ret = unsafe { esp_ble_gap_start_advertising(&mut params) };
        if ret != ESP_OK as i32 {
            return Err(TransportError::Io(ret));
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_restart_advertising(&mut self) -> Result<(), TransportError> {
        self.sim_advertising_restarts += 1;
        info!("BLE(sim): advertising '{}' again", self.device_name);
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation hooks (host only)
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl BleAdapter {
    /// A central connected; advertising stops.
    pub fn on_central_connected(&mut self) {
        info!("BLE(sim): central connected");
        self.state = BleState::Idle;
        self.link.record(true);
    }

    /// The central went away; advertising stays off until restarted.
    pub fn on_central_disconnected(&mut self) {
        info!("BLE(sim): central disconnected");
        self.link.record(false);
    }

    /// The central wrote `data` to the message characteristic.
    pub fn on_message_write(&mut self, data: &[u8]) -> bool {
        let event = crate::events::TransportEvent::write(data);
        if let crate::events::TransportEvent::Write(ref buf) = event {
            self.message_value.clone_from(buf);
        }
        crate::events::push_event(self.queue, event)
    }

    /// Every payload notified so far, oldest first.
    pub fn sim_notifications(&self) -> &[String] {
        &self.sim_notifications
    }

    pub fn sim_advertising_restarts(&self) -> u32 {
        self.sim_advertising_restarts
    }
}

// ───────────────────────────────────────────────────────────────
// LinkPort implementation
// ───────────────────────────────────────────────────────────────

impl LinkPort for BleAdapter {
    fn notify(&mut self, payload: &str) -> Result<(), TransportError> {
        self.store_value(payload)?;
        self.platform_notify(payload)
    }

    fn restart_advertising(&mut self) -> Result<(), TransportError> {
        self.platform_restart_advertising()?;
        self.state = BleState::Advertising;
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{TransportEvent, drain_events, drain_link};

    fn make_adapter() -> BleAdapter {
        let queue: &'static EventQueue = Box::leak(Box::new(EventQueue::new()));
        let link: &'static LinkState = Box::leak(Box::new(LinkState::new()));
        let mut name = heapless::String::<24>::new();
        name.push_str("BEACON-TEST").ok();
        BleAdapter::new(name, queue, link)
    }

    /// Link transitions first, then queued writes, as the main loop does.
    fn drain(adapter: &BleAdapter) -> Vec<TransportEvent> {
        let mut out = Vec::new();
        drain_link(adapter.link, |e| out.push(e));
        drain_events(adapter.queue, |e| out.push(e));
        out
    }

    #[test]
    fn start_and_connection_lifecycle() {
        let mut adapter = make_adapter();
        assert_eq!(adapter.state(), BleState::Idle);
        adapter.start().unwrap();
        assert_eq!(adapter.state(), BleState::Advertising);
        adapter.on_central_connected();
        assert_eq!(adapter.state(), BleState::Connected);
        adapter.on_central_disconnected();
        assert_eq!(adapter.state(), BleState::Idle);
        adapter.restart_advertising().unwrap();
        assert_eq!(adapter.state(), BleState::Advertising);
        assert_eq!(adapter.sim_advertising_restarts(), 1);
        assert_eq!(
            drain(&adapter),
            vec![TransportEvent::Connected, TransportEvent::Disconnected]
        );
    }

    #[test]
    fn initial_characteristic_values() {
        let adapter = make_adapter();
        assert_eq!(adapter.message_value(), b"Ready");
        assert_eq!(adapter.device_id_value(), "BEACON-TEST");
    }

    #[test]
    fn notify_requires_connection_but_updates_value() {
        let mut adapter = make_adapter();
        adapter.start().unwrap();
        assert_eq!(
            adapter.notify("{\"a\":1}"),
            Err(TransportError::NotConnected)
        );
        assert_eq!(adapter.message_value(), b"{\"a\":1}");
        assert!(adapter.sim_notifications().is_empty());

        adapter.on_central_connected();
        adapter.notify("{\"b\":2}").unwrap();
        assert_eq!(adapter.sim_notifications(), ["{\"b\":2}".to_owned()]);
    }

    #[test]
    fn rejects_oversized_payload() {
        let mut adapter = make_adapter();
        adapter.on_central_connected();
        let big = "x".repeat(MAX_VALUE_LEN + 1);
        assert_eq!(adapter.notify(&big), Err(TransportError::PayloadTooLong));
        assert_eq!(adapter.message_value(), b"Ready");
    }

    #[test]
    fn disconnect_is_kept_when_write_queue_is_full() {
        let mut adapter = make_adapter();
        adapter.start().unwrap();
        adapter.on_central_connected();
        for _ in 0..crate::events::EVENT_QUEUE_DEPTH {
            assert!(adapter.on_message_write(b"GET_STATUS"));
        }
        assert!(!adapter.on_message_write(b"GET_STATUS"));
        adapter.on_central_disconnected();

        assert!(!adapter.is_connected());
        let events = drain(&adapter);
        assert_eq!(events[0], TransportEvent::Connected);
        assert_eq!(events[1], TransportEvent::Disconnected);
        assert_eq!(events.len(), 2 + crate::events::EVENT_QUEUE_DEPTH);
    }

    #[test]
    fn write_is_queued() {
        let mut adapter = make_adapter();
        assert!(adapter.on_message_write(b"GET_STATUS"));
        assert_eq!(adapter.message_value(), b"GET_STATUS");
        assert_eq!(drain(&adapter), vec![TransportEvent::write(b"GET_STATUS")]);
    }
}
