mod redis_client_tests;
