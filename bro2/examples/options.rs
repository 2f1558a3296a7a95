//! Print the option table and the defaults

use bro2::{OptionId, ScanSettings};

fn main() {
    let settings = ScanSettings::default();

    for id in OptionId::ALL {
        let desc = id.descriptor();
        println!(
            "{:<14} {:<24} = {:<8} ({:?}, {:?})",
            desc.name,
            desc.title,
            settings.get(id),
            desc.unit,
            desc.constraint
        );
    }
}
