//! Upload zone interaction rules shared by every front end.

/// Extensions offered by the file picker.
pub const PICKER_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];
pub const PICKER_FILTER_NAME: &str = "JPG or PNG image";
pub const UPLOAD_HINT: &str = "Upload your photo (JPG or PNG, max size: 500KB).";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadZoneState {
    Empty,
    Previewing,
}

/// Where a click inside the upload zone landed. Button clicks never bubble to
/// the zone itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadZoneTarget {
    Zone,
    Change,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadZoneEffect {
    OpenPicker,
    ClearAvatar,
    Nothing,
}

pub fn upload_zone_click(state: UploadZoneState, target: UploadZoneTarget) -> UploadZoneEffect {
    match (state, target) {
        (UploadZoneState::Empty, UploadZoneTarget::Zone) => UploadZoneEffect::OpenPicker,
        (UploadZoneState::Previewing, UploadZoneTarget::Change) => UploadZoneEffect::OpenPicker,
        (UploadZoneState::Previewing, UploadZoneTarget::Remove) => UploadZoneEffect::ClearAvatar,
        _ => UploadZoneEffect::Nothing,
    }
}

/// Only the first file of a multi-file drop is taken.
pub fn first_dropped<T>(files: impl IntoIterator<Item = T>) -> Option<T> {
    files.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_zone_opens_picker() {
        assert_eq!(
            upload_zone_click(UploadZoneState::Empty, UploadZoneTarget::Zone),
            UploadZoneEffect::OpenPicker
        );
    }

    #[test]
    fn remove_clears_without_opening_picker() {
        assert_eq!(
            upload_zone_click(UploadZoneState::Previewing, UploadZoneTarget::Remove),
            UploadZoneEffect::ClearAvatar
        );
        assert_eq!(
            upload_zone_click(UploadZoneState::Previewing, UploadZoneTarget::Change),
            UploadZoneEffect::OpenPicker
        );
        assert_eq!(
            upload_zone_click(UploadZoneState::Previewing, UploadZoneTarget::Zone),
            UploadZoneEffect::Nothing
        );
    }

    #[test]
    fn takes_first_of_many_dropped_files() {
        assert_eq!(first_dropped(["a.png", "b.png"]), Some("a.png"));
        assert_eq!(first_dropped(Vec::<&str>::new()), None);
    }
}
