mod rescan;
mod tail;
