use carapax::Chain;

mod directory;
mod silencer;

pub fn setup() -> Chain {
    Chain::all().add(directory::setup()).add(silencer::handle)
}
