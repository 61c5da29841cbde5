//! End-to-end runs against a live MongoDB (`DOCCOPY_TEST_MONGO_URL`).
