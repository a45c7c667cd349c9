use manifest_notify::app::main_for;
use manifest_notify::message::Variant;

fn main() -> anyhow::Result<()> {
    main_for(Variant::DevChannel)
}
