//! OS-facing implementations of the core collaborator traits.

mod clipboard;
mod earcons;
mod notifier;
mod paste;
mod paste_key_guard;
mod permissions;

pub(crate) use {
    clipboard::ArboardClipboard, earcons::SystemEarcons, notifier::DesktopNotifier,
    paste::EnigoSynthesizer, paste_key_guard::PasteKeyGuard, permissions::SystemPermissionGate,
};

#[cfg(test)]
pub(crate) use clipboard::unwritable_entries;
