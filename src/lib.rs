// Crate entry point. Re-export modules so tests and binaries can import them easily.
//
// Responsibilities
// - Only declare and expose modules. No business logic here.
//
// How it is used
// - Tests import modules from this crate root to reach the code under test.

pub mod core {
    pub mod event;
    pub mod ports;
}

pub mod application {
    pub mod event_store;
}

pub mod adapters {
    pub mod in_memory {
        pub mod in_memory_event_repository;
    }
}

#[cfg(test)]
pub mod test_support {
    pub mod fixtures {
        pub mod event_draft;
    }
}
