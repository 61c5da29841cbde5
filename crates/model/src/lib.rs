pub mod core {
    pub mod value;
}

pub mod events;

pub mod execution {
    pub mod job;
}

pub mod pagination {
    pub mod page;
}

pub mod records {
    pub mod batch;
    pub mod record;
}
